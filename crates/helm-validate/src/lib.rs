pub mod policy;
pub mod validate;

pub use policy::FramePolicy;
pub use validate::{
    clamp_instruction, FrameValidator, InstructionFault, SafetyValidator, ValidationOutcome,
    ValidatorError,
};
