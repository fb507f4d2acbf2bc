use std::fs;
use std::io;
use std::path::Path;

use log::{debug, error, warn};

/// 从文件加载字典
///
/// 每行一个词，去掉首尾空白并跳过空行。读取失败时记录错误并返回空列表。
pub fn load_wordlist<P: AsRef<Path>>(path: P) -> Vec<String> {
    let path = path.as_ref();
    match read_lines(path) {
        Ok(words) => {
            debug!("字典 {} 加载 {} 条", path.display(), words.len());
            words
        }
        Err(e) => {
            error!("加载字典失败 {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    let bytes = fs::read(path)?;
    let mut lines = Vec::new();

    for (index, raw) in bytes.split(|b| *b == b'\n').enumerate() {
        match std::str::from_utf8(raw) {
            Ok(line) => lines.push(line.to_string()),
            Err(_) => {
                let line = String::from_utf8_lossy(raw).into_owned();
                warn!("字典 {} 第 {} 行不是有效的UTF-8: {}", path.display(), index + 1, line.trim());
                lines.push(line);
            }
        }
    }

    Ok(clean_tokens(lines.iter()))
}

/// 去除空白与空行
pub fn clean_tokens<I, S>(tokens: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .map(|token| token.as_ref().trim().to_string())
        .filter(|token| !token.is_empty())
        .collect()
}

/// 将字典展开为 `{token}.{domain}`
pub fn expand_subdomains(words: &[String], domain: &str) -> Vec<String> {
    words
        .iter()
        .map(|word| word.trim().trim_end_matches('.'))
        .filter(|word| !word.is_empty())
        .map(|word| format!("{}.{}", word, domain))
        .collect()
}
