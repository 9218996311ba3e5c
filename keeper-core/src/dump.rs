//! 转储输出的两条路径：mysqldump 子进程与流式SQL生成。
//!
//! 两条路径写出同一种制品：单个SQL流，可选gzip内联压缩。
//! 流式回退始终可用；表的服务端枚举顺序即输出顺序。

use crate::config::DatabaseProfile;
use crate::error::{KeeperError, Result};
use chrono::Utc;
use flate2::Compression;
use flate2::write::GzEncoder;
use futures::TryStreamExt;
use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};

/// 制品文件写入器：明文或gzip内联压缩
pub enum DumpWriter {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl DumpWriter {
    pub fn create(path: &Path, compress: bool) -> io::Result<Self> {
        let file = BufWriter::new(File::create(path)?);
        Ok(if compress {
            Self::Gzip(GzEncoder::new(file, Compression::default()))
        } else {
            Self::Plain(file)
        })
    }

    /// 写一行并换行
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.write_all(line.as_bytes())?;
        self.write_all(b"\n")
    }

    /// 收尾：gzip补齐尾部并落盘
    pub fn finish(self) -> io::Result<()> {
        match self {
            Self::Plain(mut w) => w.flush(),
            Self::Gzip(enc) => enc.finish()?.flush(),
        }
    }
}

impl Write for DumpWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(buf),
            Self::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            Self::Gzip(w) => w.flush(),
        }
    }
}

/// 枚举目标schema的基础表（排除视图），保持服务端顺序。
pub async fn list_base_tables(pool: &MySqlPool) -> Result<Vec<String>> {
    let rows = sqlx::query("SHOW FULL TABLES WHERE Table_type = 'BASE TABLE'")
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| row.try_get::<String, _>(0).map_err(KeeperError::from))
        .collect()
}

/// 流式回退路径：逐表写出 DROP-IF-EXISTS 守卫、DDL与批量INSERT。
/// 外键检查在输出头尾成对关闭/恢复。
pub async fn stream_dump(
    pool: &MySqlPool,
    mut writer: DumpWriter,
    schema: &str,
    tables: &[String],
    chunk_size: usize,
) -> Result<()> {
    writer.write_line(&format!("-- generated {}", Utc::now().to_rfc3339()))?;
    writer.write_line(&format!("USE `{schema}`;"))?;
    writer.write_line("SET FOREIGN_KEY_CHECKS=0;")?;
    writer.write_line("")?;

    let total = tables.len();
    for (index, table) in tables.iter().enumerate() {
        tracing::debug!("转储表 {}/{}: {}", index + 1, total, table);

        let ddl_row = sqlx::query(&format!("SHOW CREATE TABLE `{table}`"))
            .fetch_one(pool)
            .await?;
        let ddl: String = ddl_row.try_get(1)?;

        writer.write_line(&format!("-- Structure for `{table}`"))?;
        writer.write_line(&format!("DROP TABLE IF EXISTS `{table}`;"))?;
        writer.write_line(&format!("{ddl};"))?;
        writer.write_line("")?;
        writer.write_line(&format!("-- Data for `{table}`"))?;

        let select = format!("SELECT * FROM `{table}`");
        let mut rows = sqlx::query(&select).fetch(pool);

        let mut insert_prefix: Option<String> = None;
        let mut batch: Vec<String> = Vec::with_capacity(chunk_size);

        while let Some(row) = rows.try_next().await? {
            if insert_prefix.is_none() {
                let columns: Vec<String> = row
                    .columns()
                    .iter()
                    .map(|c| format!("`{}`", c.name()))
                    .collect();
                insert_prefix = Some(format!(
                    "INSERT INTO `{table}` ({}) VALUES ",
                    columns.join(", ")
                ));
            }

            let mut values = Vec::with_capacity(row.columns().len());
            for idx in 0..row.columns().len() {
                values.push(value_literal(&row, idx)?);
            }
            batch.push(format!("({})", values.join(", ")));

            if batch.len() >= chunk_size {
                if let Some(prefix) = insert_prefix.as_deref() {
                    flush_batch(&mut writer, prefix, &mut batch)?;
                }
            }
        }

        if !batch.is_empty() {
            if let Some(prefix) = insert_prefix.as_deref() {
                flush_batch(&mut writer, prefix, &mut batch)?;
            }
        }
        writer.write_line("")?;
    }

    writer.write_line("SET FOREIGN_KEY_CHECKS=1;")?;
    writer.finish()?;
    Ok(())
}

fn flush_batch(writer: &mut DumpWriter, prefix: &str, batch: &mut Vec<String>) -> io::Result<()> {
    writer.write_line(&format!("{prefix}{};", batch.join(",\n")))?;
    batch.clear();
    Ok(())
}

/// 按列类型把一行中的一个值渲染为SQL字面量（NULL安全）。
fn value_literal(row: &MySqlRow, idx: usize) -> Result<String> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok("NULL".to_string());
    }

    let type_name = row.columns()[idx].type_info().name().to_string();
    let literal = match type_name.as_str() {
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            row.try_get::<i64, _>(idx)?.to_string()
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" | "YEAR" => row.try_get::<u64, _>(idx)?.to_string(),
        "FLOAT" => row.try_get::<f32, _>(idx)?.to_string(),
        "DOUBLE" => row.try_get::<f64, _>(idx)?.to_string(),
        "DATE" => format!("'{}'", row.try_get::<chrono::NaiveDate, _>(idx)?),
        "TIME" => format!("'{}'", row.try_get::<chrono::NaiveTime, _>(idx)?),
        "DATETIME" => format!(
            "'{}'",
            row.try_get::<chrono::NaiveDateTime, _>(idx)?
                .format("%Y-%m-%d %H:%M:%S%.f")
        ),
        "TIMESTAMP" => format!(
            "'{}'",
            row.try_get::<chrono::DateTime<Utc>, _>(idx)?
                .format("%Y-%m-%d %H:%M:%S%.f")
        ),
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
            bytes_literal(&row.try_get::<Vec<u8>, _>(idx)?)
        }
        // CHAR/VARCHAR/TEXT/ENUM/SET/DECIMAL/JSON 等一律按文本引用
        _ => quote_str(&row.try_get::<String, _>(idx)?),
    };
    Ok(literal)
}

fn bytes_literal(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return "''".to_string();
    }
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

/// 按MySQL规则引用并转义字符串字面量
fn quote_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            '\x1a' => out.push_str("\\Z"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// 快速路径：以显式参数表调用 mysqldump，stdout直写制品文件。
/// 非零退出码是硬失败。阻塞函数，调用方放入 spawn_blocking。
pub fn run_mysqldump_blocking(
    bin: &Path,
    profile: &DatabaseProfile,
    skip_tables: &[String],
    out_path: &Path,
    compress: bool,
) -> Result<()> {
    let mut cmd = Command::new(bin);
    cmd.arg(format!("--host={}", profile.host))
        .arg(format!("--port={}", profile.port))
        .arg(format!("--user={}", profile.user))
        .arg(format!("--password={}", profile.pass))
        .arg("--single-transaction")
        .arg("--quick")
        .arg("--skip-lock-tables");

    for table in skip_tables {
        cmd.arg(format!("--ignore-table={}.{}", profile.name, table));
    }
    cmd.arg(&profile.name);

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn()?;
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| KeeperError::backup("无法接管转储子进程的stdout"))?;

    let mut writer = DumpWriter::create(out_path, compress)?;
    io::copy(&mut stdout, &mut writer)?;
    writer.finish()?;

    let mut stderr_text = String::new();
    if let Some(mut stderr) = child.stderr.take() {
        let _ = stderr.read_to_string(&mut stderr_text);
    }

    let status = child.wait()?;
    if !status.success() {
        return Err(KeeperError::tool(
            status.code().unwrap_or(-1),
            format!("mysqldump 失败: {}", stderr_text.trim()),
        ));
    }
    Ok(())
}
