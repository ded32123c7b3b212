mod bands;
mod source_pipe;
mod spectrum;

pub use bands::{extract, BandEnergies};
pub use source_pipe::SourcePipe;
pub use spectrum::{SpectrumFrame, SpectrumSampler, DEFAULT_FFT_SIZE};
