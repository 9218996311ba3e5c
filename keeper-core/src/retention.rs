//! 按别名目录执行 keep-N 轮换。
//!
//! 文件名内嵌秒级UTC时间戳，字典序降序即时间降序；
//! 超出保留数量的制品连同其摘要sidecar一并删除。
//! 删除失败只记日志，绝不影响触发它的那次备份。

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

static ARTIFACT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.enc$|\.sql(\.gz)?$").expect("内置制品名正则"));

/// 保留目录内最新的 `keep` 个制品，删除其余及其sidecar。
pub fn enforce(dir: &Path, keep: usize) {
    let entries = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) => {
            tracing::warn!("轮换时无法读取目录 {}: {e}", dir.display());
            return;
        }
    };

    let mut artifacts: Vec<String> = entries
        .flatten()
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| ARTIFACT_RE.is_match(name))
        .collect();

    // 降序：最新的在前
    artifacts.sort();
    artifacts.reverse();

    for old in artifacts.iter().skip(keep) {
        let path = dir.join(old);
        if let Err(e) = fs::remove_file(&path) {
            tracing::warn!("轮换删除 {} 失败: {e}", path.display());
        } else {
            tracing::info!("轮换删除过期制品: {old}");
        }

        let sidecar = dir.join(format!("{old}.sha256"));
        if sidecar.exists() {
            if let Err(e) = fs::remove_file(&sidecar) {
                tracing::warn!("轮换删除 {} 失败: {e}", sidecar.display());
            }
        }
    }
}
