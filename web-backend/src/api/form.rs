use actix_multipart::Multipart;
use futures_util::TryStreamExt;
use pipeaudit_core::ScanInput;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormError {
    #[error("Failed to read field: {0}")]
    Field(String),

    #[error("Malformed multipart body: {0}")]
    Multipart(String),
}

/// 扫描表单的原始字段
#[derive(Debug, Default)]
pub struct ScanForm {
    pub upload: Option<(String, Vec<u8>)>,
    pub workflow: Option<String>,
    pub file_name: Option<String>,
    pub level: Option<String>,
    pub only_status: Option<String>,
    /// 某个字段超过上传上限
    pub oversize: bool,
}

impl ScanForm {
    /// 选出提交内容：选择的文件优先于粘贴文本，未选文件时浏览器发送的空 `file` 字段视为缺失
    pub fn into_input(self) -> ScanInput {
        match (self.upload, self.workflow) {
            (Some((name, bytes)), _) => ScanInput::Upload { name, bytes },
            (None, Some(text)) if !text.is_empty() => ScanInput::Paste {
                name: self.file_name,
                text,
            },
            _ => ScanInput::Nothing,
        }
    }
}

pub async fn read_scan_form(mut payload: Multipart, limit: usize) -> Result<ScanForm, FormError> {
    let mut form = ScanForm::default();

    loop {
        match payload.try_next().await {
            Ok(Some(mut field)) => {
                let name = field.name().unwrap_or("").to_string();
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .map(|f| f.to_string());

                // 超过上限时停止读取剩余字段
                let data = match field.bytes(limit).await {
                    Ok(Ok(bytes)) => Vec::from(bytes.as_ref()),
                    Ok(Err(e)) => return Err(FormError::Field(e.to_string())),
                    Err(_) => {
                        form.oversize = true;
                        break;
                    }
                };

                match name.as_str() {
                    "file" => {
                        if let Some(filename) = filename.filter(|f| !f.is_empty()) {
                            form.upload = Some((filename, data));
                        }
                    }
                    "workflow" => form.workflow = Some(text(data)),
                    "file_name" => form.file_name = Some(text(data)),
                    "level" => form.level = Some(text(data)),
                    "only_status" => form.only_status = Some(text(data)),
                    other => tracing::debug!("Ignoring form field {}", other),
                }
            }
            Ok(None) => break,
            Err(e) => return Err(FormError::Multipart(e.to_string())),
        }
    }

    Ok(form)
}

fn text(data: Vec<u8>) -> String {
    String::from_utf8_lossy(&data).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chosen_file_wins_over_paste() {
        let form = ScanForm {
            upload: Some(("ci.yml".to_string(), b"on: push".to_vec())),
            workflow: Some("on: pull_request".to_string()),
            ..Default::default()
        };
        assert_eq!(
            form.into_input(),
            ScanInput::Upload {
                name: "ci.yml".to_string(),
                bytes: b"on: push".to_vec()
            }
        );
    }

    #[test]
    fn paste_carries_optional_name() {
        let form = ScanForm {
            workflow: Some("on: push".to_string()),
            file_name: Some("deploy.yml".to_string()),
            ..Default::default()
        };
        assert_eq!(
            form.into_input(),
            ScanInput::Paste {
                name: Some("deploy.yml".to_string()),
                text: "on: push".to_string()
            }
        );
    }

    #[test]
    fn blank_form_is_nothing() {
        let form = ScanForm {
            workflow: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(form.into_input(), ScanInput::Nothing);
    }
}
