use std::fmt;
use std::path::PathBuf;

use crate::config::CompressionKind;
use crate::error::Result;
use crate::model::{DataBlock, IntermediateImage, MipLevel};

pub mod etc2;
pub mod raw;
pub mod s3tc;

pub use etc2::Etc2Encoder;
pub use raw::RawPassthrough;
pub use s3tc::S3tcEncoder;

/// Turns one intermediate image into the block stored for one compression kind.
///
/// Implementations must validate everything a collaborator produced before
/// returning; a returned block is trusted as-is by the container writer.
pub trait Encoder: Send + Sync {
    fn kind(&self) -> CompressionKind;
    fn encode(&self, image: &IntermediateImage, level: &MipLevel) -> Result<DataBlock>;
}

/// Progress of one codec adapter unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Pending,
    Encoding,
    Validating,
    Accepted,
    Rejected,
}

impl fmt::Display for AdapterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Encoding => "encoding",
            Self::Validating => "validating",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        })
    }
}

/// Settings shared by the codec adapters of one job.
#[derive(Debug, Clone)]
pub struct EncodeSettings {
    /// Directory the encoders write their vendor containers into.
    pub scratch: PathBuf,
    pub fast: bool,
    pub normal: bool,
}
