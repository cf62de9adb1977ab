use thiserror::Error;

pub const CPF_LEN: usize = 11;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("CPF must contain 11 numeric digits")]
pub struct InvalidCpf;

/// Strip formatting ("123.456.789-01") and require exactly eleven digits.
pub fn normalize(raw: &str) -> Result<String, InvalidCpf> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    if digits.len() == CPF_LEN {
        Ok(digits)
    } else {
        Err(InvalidCpf)
    }
}
