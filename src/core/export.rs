use crate::utils::error::{AddressError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Tab,
}

impl Delimiter {
    fn as_byte(&self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
        }
    }
}

/// Renders a `code -> name` list with a `code,name` header.
pub fn render_list(list: &[(String, String)], delimiter: Delimiter) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter.as_byte())
        .from_writer(Vec::new());

    writer.write_record(["code", "name"])?;
    for (code, name) in list {
        writer.write_record([code, name])?;
    }

    let data = writer.into_inner().map_err(|e| AddressError::IoError(e.into_error()))?;
    String::from_utf8(data)
        .map_err(|e| AddressError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}
