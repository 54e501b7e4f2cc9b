//! Audio subsystem: decode, resample, loop and output

pub mod decoder;
pub mod output;
pub mod resampler;
pub mod sink;
pub mod source;
pub mod track;
pub mod types;

pub use decoder::SimpleDecoder;
pub use output::AudioOutput;
pub use resampler::Resampler;
pub use sink::{Deck, OutputSink, SinkKind};
pub use source::{AssetLoader, AudioSource, LoopingSource, SourceLoader};
pub use track::LoopTrack;
pub use types::{AudioFrame, DecodedAudio};
