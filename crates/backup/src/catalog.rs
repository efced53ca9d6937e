//! Seed catalog: the curated baseline content shipped with the product.
//!
//! Ids are stable slugs; the migration runner diffs the catalog against the
//! database by id, so renaming a slug here means a new entity, not an
//! update. Catalog entries must always pass the same validation rules as
//! imported data.

use hoclieu_db::models::ai_tool::UpsertAiTool;
use hoclieu_db::models::template::UpsertTemplate;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The curated AI tool catalog for grades 1-9.
pub fn seed_ai_tools() -> Vec<UpsertAiTool> {
    vec![
        UpsertAiTool {
            id: "geogebra".to_string(),
            name: "GeoGebra".to_string(),
            description: "Công cụ toán học động: hình học, đại số, bảng tính và đồ thị \
                          cho bài giảng trực quan."
                .to_string(),
            category: "toan-hoc".to_string(),
            url: "https://www.geogebra.org".to_string(),
            subjects: strings(&["Toán"]),
            grade_levels: strings(&["6", "7", "8", "9"]),
            features: strings(&["đồ thị", "hình học động", "miễn phí"]),
            tags: strings(&["toán", "trực quan"]),
            is_active: true,
        },
        UpsertAiTool {
            id: "khanmigo".to_string(),
            name: "Khanmigo".to_string(),
            description: "Trợ giảng AI của Khan Academy, hướng dẫn học sinh từng bước \
                          thay vì đưa đáp án."
                .to_string(),
            category: "tro-giang".to_string(),
            url: "https://www.khanmigo.ai".to_string(),
            subjects: strings(&["Toán", "Khoa học", "Tiếng Anh"]),
            grade_levels: strings(&["4", "5", "6", "7", "8", "9"]),
            features: strings(&["hỏi đáp", "gợi ý từng bước"]),
            tags: strings(&["trợ giảng", "cá nhân hóa"]),
            is_active: true,
        },
        UpsertAiTool {
            id: "canva-education".to_string(),
            name: "Canva for Education".to_string(),
            description: "Thiết kế bài giảng, phiếu bài tập và infographic với mẫu có sẵn \
                          và trợ lý AI."
                .to_string(),
            category: "thiet-ke".to_string(),
            url: "https://www.canva.com/education".to_string(),
            subjects: strings(&["Mỹ thuật", "Tin học"]),
            grade_levels: strings(&["1", "2", "3", "4", "5", "6", "7", "8", "9"]),
            features: strings(&["mẫu thiết kế", "cộng tác"]),
            tags: strings(&["thiết kế", "bài giảng"]),
            is_active: true,
        },
        UpsertAiTool {
            id: "quizizz".to_string(),
            name: "Quizizz".to_string(),
            description: "Tạo câu hỏi trắc nghiệm tương tác, có chế độ AI sinh câu hỏi \
                          từ nội dung bài học."
                .to_string(),
            category: "kiem-tra".to_string(),
            url: "https://quizizz.com".to_string(),
            subjects: strings(&["Toán", "Tiếng Việt", "Khoa học", "Lịch sử"]),
            grade_levels: strings(&["3", "4", "5", "6", "7", "8", "9"]),
            features: strings(&["trắc nghiệm", "trò chơi", "báo cáo"]),
            tags: strings(&["kiểm tra", "tương tác"]),
            is_active: true,
        },
        UpsertAiTool {
            id: "elsa-speak".to_string(),
            name: "ELSA Speak".to_string(),
            description: "Luyện phát âm tiếng Anh bằng AI nhận dạng giọng nói, phản hồi \
                          đến từng âm tiết."
                .to_string(),
            category: "ngoai-ngu".to_string(),
            url: "https://elsaspeak.com".to_string(),
            subjects: strings(&["Tiếng Anh"]),
            grade_levels: strings(&["3", "4", "5", "6", "7", "8", "9"]),
            features: strings(&["nhận dạng giọng nói", "chấm điểm phát âm"]),
            tags: strings(&["tiếng anh", "phát âm"]),
            is_active: true,
        },
        UpsertAiTool {
            id: "scratch".to_string(),
            name: "Scratch".to_string(),
            description: "Ngôn ngữ lập trình kéo thả cho học sinh, nền tảng cho tư duy \
                          thuật toán ở tiểu học và THCS."
                .to_string(),
            category: "lap-trinh".to_string(),
            url: "https://scratch.mit.edu".to_string(),
            subjects: strings(&["Tin học"]),
            grade_levels: strings(&["3", "4", "5", "6", "7", "8"]),
            features: strings(&["kéo thả", "dự án mẫu", "cộng đồng"]),
            tags: strings(&["lập trình", "tư duy máy tính"]),
            is_active: true,
        },
        UpsertAiTool {
            id: "padlet".to_string(),
            name: "Padlet".to_string(),
            description: "Bảng ghim trực tuyến để cả lớp cùng đóng góp ý kiến, hình ảnh \
                          và sản phẩm học tập."
                .to_string(),
            category: "cong-tac".to_string(),
            url: "https://padlet.com".to_string(),
            subjects: strings(&["Tiếng Việt", "Khoa học", "Mỹ thuật"]),
            grade_levels: strings(&["1", "2", "3", "4", "5", "6", "7", "8", "9"]),
            features: strings(&["bảng ghim", "cộng tác thời gian thực"]),
            tags: strings(&["cộng tác", "thảo luận"]),
            is_active: true,
        },
        UpsertAiTool {
            id: "diffit".to_string(),
            name: "Diffit".to_string(),
            description: "Điều chỉnh độ khó văn bản theo trình độ đọc, tạo phiếu đọc hiểu \
                          phân hóa cho từng nhóm học sinh."
                .to_string(),
            category: "phan-hoa".to_string(),
            url: "https://diffit.me".to_string(),
            subjects: strings(&["Tiếng Việt", "Tiếng Anh", "Khoa học"]),
            grade_levels: strings(&["2", "3", "4", "5", "6", "7", "8", "9"]),
            features: strings(&["điều chỉnh văn bản", "câu hỏi đọc hiểu"]),
            tags: strings(&["phân hóa", "đọc hiểu"]),
            is_active: true,
        },
    ]
}

/// The curated lesson template catalog.
pub fn seed_templates() -> Vec<UpsertTemplate> {
    vec![
        UpsertTemplate {
            id: "giao-an-5512".to_string(),
            name: "Giáo án theo Công văn 5512".to_string(),
            description: "Khung giáo án chuẩn theo Công văn 5512/BGDĐT-GDTrH: mục tiêu, \
                          thiết bị, tiến trình bốn hoạt động."
                .to_string(),
            file_url: "https://hoclieu.example.com/templates/giao-an-5512.docx".to_string(),
            subjects: strings(&["Toán", "Ngữ văn", "Khoa học tự nhiên"]),
            grade_levels: strings(&["6", "7", "8", "9"]),
            features: strings(&["chuẩn 5512", "bốn hoạt động"]),
            tags: strings(&["giáo án", "thcs"]),
            is_active: true,
        },
        UpsertTemplate {
            id: "giao-an-tieu-hoc-2345".to_string(),
            name: "Kế hoạch bài dạy tiểu học (CV 2345)".to_string(),
            description: "Mẫu kế hoạch bài dạy tiểu học theo Công văn 2345, tinh gọn cho \
                          giáo viên chủ nhiệm."
                .to_string(),
            file_url: "https://hoclieu.example.com/templates/ke-hoach-bai-day-2345.docx"
                .to_string(),
            subjects: strings(&["Toán", "Tiếng Việt", "Tự nhiên và Xã hội"]),
            grade_levels: strings(&["1", "2", "3", "4", "5"]),
            features: strings(&["tinh gọn", "chuẩn 2345"]),
            tags: strings(&["giáo án", "tiểu học"]),
            is_active: true,
        },
        UpsertTemplate {
            id: "phieu-bai-tap-toan".to_string(),
            name: "Phiếu bài tập Toán cuối tuần".to_string(),
            description: "Phiếu bài tập Toán theo tuần, ba mức độ từ nhận biết đến vận \
                          dụng cao."
                .to_string(),
            file_url: "https://hoclieu.example.com/templates/phieu-bai-tap-toan.docx".to_string(),
            subjects: strings(&["Toán"]),
            grade_levels: strings(&["1", "2", "3", "4", "5"]),
            features: strings(&["ba mức độ", "in được"]),
            tags: strings(&["bài tập", "toán"]),
            is_active: true,
        },
        UpsertTemplate {
            id: "de-kiem-tra-ma-tran".to_string(),
            name: "Đề kiểm tra kèm ma trận đặc tả".to_string(),
            description: "Mẫu đề kiểm tra định kỳ kèm ma trận và bản đặc tả theo hướng \
                          dẫn của Bộ."
                .to_string(),
            file_url: "https://hoclieu.example.com/templates/de-kiem-tra-ma-tran.docx".to_string(),
            subjects: strings(&["Toán", "Ngữ văn", "Tiếng Anh", "Khoa học tự nhiên"]),
            grade_levels: strings(&["6", "7", "8", "9"]),
            features: strings(&["ma trận", "bản đặc tả"]),
            tags: strings(&["kiểm tra", "đánh giá"]),
            is_active: true,
        },
        UpsertTemplate {
            id: "bai-giang-dien-tu".to_string(),
            name: "Bài giảng điện tử PowerPoint".to_string(),
            description: "Bộ slide bài giảng điện tử với hiệu ứng vừa phải, phù hợp trình \
                          chiếu trên lớp."
                .to_string(),
            file_url: "https://hoclieu.example.com/templates/bai-giang-dien-tu.pptx".to_string(),
            subjects: strings(&["Toán", "Tiếng Việt", "Khoa học", "Lịch sử và Địa lí"]),
            grade_levels: strings(&["1", "2", "3", "4", "5", "6", "7", "8", "9"]),
            features: strings(&["trình chiếu", "hiệu ứng"]),
            tags: strings(&["bài giảng", "powerpoint"]),
            is_active: true,
        },
        UpsertTemplate {
            id: "so-theo-doi-hoc-sinh".to_string(),
            name: "Sổ theo dõi tiến bộ học sinh".to_string(),
            description: "Bảng tính theo dõi điểm và nhận xét định tính theo Thông tư 22, \
                          tự tổng hợp cuối kỳ."
                .to_string(),
            file_url: "https://hoclieu.example.com/templates/so-theo-doi-hoc-sinh.xlsx"
                .to_string(),
            subjects: strings(&["Toán", "Tiếng Việt"]),
            grade_levels: strings(&["1", "2", "3", "4", "5"]),
            features: strings(&["tự tổng hợp", "thông tư 22"]),
            tags: strings(&["đánh giá", "sổ điểm"]),
            is_active: true,
        },
    ]
}
