use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("nbt: {0}")]
    Nbt(#[from] fastnbt::error::Error),
    #[error("no Blocks array found")]
    MissingBlocks,
    #[error("Blocks array has {0} bytes")]
    BadLength(usize),
}
