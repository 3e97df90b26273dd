use chrono::{DateTime, Local};

use crate::llm::types::{ChatMessage, GenerationRequest, Role, Turn};

/// How the instruction block reaches the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionChannel {
    /// Separate system-instruction field.
    System,
    /// Prepended to the user prompt, for models without a system channel.
    Merged,
}

impl InstructionChannel {
    pub fn for_model(model: &str) -> Self {
        if model.to_lowercase().contains("gemma") {
            InstructionChannel::Merged
        } else {
            InstructionChannel::System
        }
    }
}

pub fn instruction_block(now: DateTime<Local>) -> String {
    let current_time = now.format("%d/%m/%Y %H:%M:%S");
    format!(
        "Bạn là Trợ lý AI chuyên trách nhân sự và thông tin công ty NHTC. Hôm nay là ngày {current_time}.\n\
         NHIỆM VỤ: Trả lời câu hỏi dựa trên cung cấp trong phần 'DỮ LIỆU NGỮ CẢNH' hoặc kiến thức chung nếu phù hợp.\n\n\
         QUY TẮC QUAN TRỌNG:\n\
         1. BẢO MẬT (TUYỆT ĐỐI): Không bao giờ hiển thị Số CCCD, CMND, Mã số thuế, Mật khẩu hoặc Thông tin lương của bất kỳ ai ngay cả khi có trong ngữ cảnh. Chỉ cung cấp: Họ tên, Phòng ban, Chức vụ, Email, và Số điện thoại liên lạc.\n\
         2. ĐỐI VỚI THÔNG TIN CÔNG TY/NHÂN SỰ: Chỉ sử dụng thông tin trong 'DỮ LIỆU NGỮ CẢNH'. Tuyệt đối không tự bịa thông tin. Thừa nhận nếu không tìm thấy thông tin.\n\
         3. ĐỐI VỚI KIẾN THỨC CHUNG/CHÀO HỎI: Trả lời lịch sự, chuyên nghiệp.\n\
         4. TRÌNH BÀY: Dùng Markdown Table cho danh sách nhân sự. Giữ nguyên tên đầy đủ."
    )
}

/// Every message but the last; anything that is not `user` speaks as the model.
pub fn history_turns(messages: &[ChatMessage]) -> Vec<Turn> {
    let Some((_, earlier)) = messages.split_last() else {
        return Vec::new();
    };
    earlier
        .iter()
        .map(|m| Turn {
            role: if m.is_user() { Role::User } else { Role::Model },
            content: m.content.clone(),
        })
        .collect()
}

pub fn assemble(
    messages: &[ChatMessage],
    context: &str,
    query: &str,
    channel: InstructionChannel,
    now: DateTime<Local>,
) -> GenerationRequest {
    let instructions = instruction_block(now);
    let grounded = format!("DỮ LIỆU NGỮ CẢNH:\n{context}\n\nCÂU HỎI: {query}");

    let (system_instruction, prompt) = match channel {
        InstructionChannel::System => (Some(instructions), grounded),
        InstructionChannel::Merged => (None, format!("{instructions}\n\n---\n{grounded}")),
    };

    GenerationRequest {
        system_instruction,
        history: history_turns(messages),
        prompt,
        temperature: None,
    }
}
