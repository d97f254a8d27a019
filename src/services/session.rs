use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha1::{Digest, Sha1};
use uuid::Uuid;

/// 一次运行的输出位置，图片目录和 PDF 共用同一个 id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: String,
    pub images_dir: PathBuf,
    pub pdf_path: PathBuf,
}

impl Session {
    /// `<images_root>/<id>/` 与 `<pdf_root>/<id>.pdf`
    pub fn create(images_root: &Path, pdf_root: &Path) -> Self {
        Self::create_at(Utc::now(), images_root, pdf_root)
    }

    pub fn create_at(now: DateTime<Utc>, images_root: &Path, pdf_root: &Path) -> Self {
        let id = format!("{}_{}", now.format("%Y%m%d_%H%M%S"), short_hash());
        Self {
            images_dir: images_root.join(&id),
            pdf_path: pdf_root.join(format!("{}.pdf", id)),
            id,
        }
    }
}

/// 8 位十六进制，来自随机数、进程号和纳秒时间，不依赖目标地址
fn short_hash() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let seed = format!("{}:{}:{}", Uuid::new_v4(), std::process::id(), nanos);
    let digest = Sha1::digest(seed.as_bytes());
    hex::encode(&digest[..4])
}
