pub mod decoder;
pub mod preprocess;

pub use decoder::{decode_audio, sniff_container, DecodedAudio};
pub use preprocess::{preprocess, write_wav_16k_mono};
