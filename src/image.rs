//! Compiled program images and their binary file format.
//!
//! The instruction image is stored as consecutive little-endian 32-bit words and
//! the data image as raw bytes. Neither file has a header.

use byteorder::{ByteOrder, LittleEndian};

use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

use crate::parsing::Span;
use crate::source_map::SourceMap;
use crate::symbol_table::SymbolTable;

/// The output of the compiler.
#[derive(Clone, Debug, Default)]
pub struct Image {
    /// Word-addressed instruction image.
    pub code: Vec<u32>,

    /// Byte-addressed data image. Words are 4-byte aligned and little-endian.
    pub data: Vec<u8>,

    /// Disassembly of the instruction image, one line per instruction.
    pub listing: Vec<String>,

    /// Maps instruction addresses to the statements they were generated from.
    pub source_map: SourceMap<Span>,

    /// Symbols declared in the global scope.
    pub globals: SymbolTable,
}

impl Image {
    /// Reads the data word at byte address `addr`.
    pub fn data_word(&self, addr: u32) -> Option<i32> {
        let addr = addr as usize;
        let bytes = self.data.get(addr..addr + 4)?;
        Some(LittleEndian::read_i32(bytes))
    }

    /// Writes `<prefix>.code` and `<prefix>.data`.
    pub fn save<P: AsRef<Path>>(&self, prefix: P) -> Result<(), ImageError> {
        let prefix = prefix.as_ref();

        let mut code = std::fs::File::create(prefix.with_extension("code"))?;
        write_code(&mut code, &self.code)?;

        let mut data = std::fs::File::create(prefix.with_extension("data"))?;
        write_data(&mut data, &self.data)?;

        Ok(())
    }
}

#[derive(Debug)]
pub enum ImageError {
    /// The instruction image length is not a multiple of the word size.
    Misaligned { len: usize },
    Io(std::io::Error),
}

impl From<std::io::Error> for ImageError {
    fn from(err: std::io::Error) -> ImageError {
        ImageError::Io(err)
    }
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ImageError::Misaligned { len } => {
                write!(f, "instruction image of {} bytes is not a whole number of words", len)
            }
            ImageError::Io(err) => write!(f, "{}", err),
        }
    }
}

/// Decodes an instruction image from its byte representation.
pub fn code_from_bytes(bytes: &[u8]) -> Result<Vec<u32>, ImageError> {
    if bytes.len() % 4 != 0 {
        return Err(ImageError::Misaligned { len: bytes.len() });
    }

    let mut words = vec![0; bytes.len() / 4];
    LittleEndian::read_u32_into(bytes, &mut words);

    Ok(words)
}

pub fn code_to_bytes(words: &[u32]) -> Vec<u8> {
    let mut bytes = vec![0; words.len() * 4];
    LittleEndian::write_u32_into(words, &mut bytes);
    bytes
}

pub fn read_code<R: Read>(mut reader: R) -> Result<Vec<u32>, ImageError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    code_from_bytes(&bytes)
}

pub fn write_code<W: Write>(mut writer: W, words: &[u32]) -> Result<(), ImageError> {
    writer.write_all(&code_to_bytes(words))?;
    Ok(())
}

pub fn read_data<R: Read>(mut reader: R) -> Result<Vec<u8>, ImageError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(bytes)
}

pub fn write_data<W: Write>(mut writer: W, bytes: &[u8]) -> Result<(), ImageError> {
    writer.write_all(bytes)?;
    Ok(())
}

/// Loads `<prefix>.code` and, if it exists, `<prefix>.data`.
pub fn load<P: AsRef<Path>>(prefix: P) -> Result<(Vec<u32>, Vec<u8>), ImageError> {
    let prefix = prefix.as_ref();

    let code = read_code(std::fs::File::open(prefix.with_extension("code"))?)?;

    let data_path = prefix.with_extension("data");
    let data = if data_path.exists() {
        read_data(std::fs::File::open(data_path)?)?
    } else {
        Vec::new()
    };

    Ok((code, data))
}
