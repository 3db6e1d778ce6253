use crate::error::AvroErr;
use std::cmp::Ordering;

// Total order on floats matching the `<` / `==` comparison: NaN sorts after everything.
#[inline(always)]
pub(crate) fn compare_f64(a: f64, b: f64) -> Ordering {
    if a == b {
        Ordering::Equal
    } else if a < b {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

// Avro's JSON encoding maps each byte to the code point of the same value.
pub(crate) fn latin1_to_bytes(s: &str) -> Result<Vec<u8>, AvroErr> {
    s.chars()
        .map(|c| {
            let cp = c as u32;
            if cp <= 0xff {
                Ok(cp as u8)
            } else {
                Err(AvroErr::InvalidJson {
                    value: s.to_string(),
                    schema: "bytes".to_string(),
                })
            }
        })
        .collect()
}

pub(crate) fn bytes_to_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|b| *b as char).collect()
}
