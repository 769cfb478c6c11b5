use crate::frame::OutputFrame;
use crate::instruction::BytecodeInstruction;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn parse_frame(json: &str) -> Result<OutputFrame, ParseError> {
    Ok(serde_json::from_str(json)?)
}

pub fn parse_instruction(json: &str) -> Result<BytecodeInstruction, ParseError> {
    Ok(serde_json::from_str(json)?)
}
