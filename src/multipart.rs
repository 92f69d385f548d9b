//! Multipart/form-data encoding, used by the body encoder (C6) when the
//! caller supplies files (spec §4.4, §6: 32 hex char boundary, `\r\n`
//! part terminators). Grounded on the teacher's `client::multipart`
//! surface (referenced from `client/mod.rs` as `pub mod multipart`) and
//! `mime_guess` for content-type inference.

use rand::RngCore;

/// A single simple (non-file) form field.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub value: String,
}

/// A single file part.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// A `multipart/form-data` body builder: simple fields first, then file
/// parts, per spec §4.4.
#[derive(Debug, Clone, Default)]
pub struct Form {
    boundary: String,
    fields: Vec<Field>,
    files: Vec<FilePart>,
}

impl Form {
    /// Creates a new form with a fresh random boundary (128 bits of
    /// entropy, rendered as 32 hex characters — spec §6).
    pub fn new() -> Form {
        Form {
            boundary: random_boundary(),
            ..Default::default()
        }
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Form {
        self.fields.push(Field {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn file(mut self, part: FilePart) -> Form {
        self.files.push(part);
        self
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Serializes the form per spec §4.4: each part is
    /// `Content-Disposition: form-data; name="..."[; filename="..."]\r\n[Content-Type: ...]\r\n\r\n<bytes>\r\n`,
    /// closed by `--<boundary>--\r\n`.
    pub fn into_bytes(self) -> Vec<u8> {
        let mut out = Vec::new();

        for field in &self.fields {
            write_part_header(&mut out, &self.boundary, &field.name, None, None);
            out.extend_from_slice(field.value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }

        for file in &self.files {
            let content_type = file.content_type.clone().or_else(|| {
                file.filename
                    .as_ref()
                    .map(|fname| mime_guess::from_path(fname).first_or_octet_stream().to_string())
            });
            write_part_header(
                &mut out,
                &self.boundary,
                &file.name,
                file.filename.as_deref(),
                content_type.as_deref(),
            );
            out.extend_from_slice(&file.bytes);
            out.extend_from_slice(b"\r\n");
        }

        out.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        out
    }
}

fn write_part_header(
    out: &mut Vec<u8>,
    boundary: &str,
    name: &str,
    filename: Option<&str>,
    content_type: Option<&str>,
) {
    out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    match filename {
        Some(filename) => out.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n")
                .as_bytes(),
        ),
        None => out.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n").as_bytes(),
        ),
    }
    if let Some(content_type) = content_type {
        out.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
    }
    out.extend_from_slice(b"\r\n");
}

fn random_boundary() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_is_32_hex_chars() {
        let form = Form::new();
        assert_eq!(form.boundary().len(), 32);
        assert!(form.boundary().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn simple_fields_come_before_file_parts() {
        let form = Form::new()
            .text("field1", "value1")
            .file(FilePart {
                name: "upload".to_string(),
                filename: Some("a.txt".to_string()),
                content_type: None,
                bytes: b"file contents".to_vec(),
            });
        let boundary = form.boundary().to_string();
        let bytes = form.into_bytes();
        let text = String::from_utf8(bytes).unwrap();

        let field_pos = text.find("name=\"field1\"").unwrap();
        let file_pos = text.find("name=\"upload\"").unwrap();
        assert!(field_pos < file_pos);
        assert!(text.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[test]
    fn file_part_infers_content_type_from_filename() {
        let form = Form::new().file(FilePart {
            name: "upload".to_string(),
            filename: Some("a.json".to_string()),
            content_type: None,
            bytes: b"{}".to_vec(),
        });
        let text = String::from_utf8(form.into_bytes()).unwrap();
        assert!(text.contains("Content-Type: application/json"));
    }
}
