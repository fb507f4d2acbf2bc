use std::collections::HashSet;

/// 规范化主机名: 去空白、转小写、去掉末尾的点
pub fn normalize_hostname(host: &str) -> String {
    host.trim().trim_end_matches('.').to_lowercase()
}

/// 判断主机名是否等于目标域名或是其子域名
pub fn belongs_to_domain(host: &str, domain: &str) -> bool {
    let host = normalize_hostname(host);
    let domain = normalize_hostname(domain);
    host == domain || host.ends_with(&format!(".{}", domain))
}

/// 合并多个来源的候选子域名
///
/// 按首次出现的顺序输出，大小写不同的重复项只保留一份。
pub fn merge_candidates<I, S>(candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for candidate in candidates {
        let host = normalize_hostname(candidate.as_ref());
        if host.is_empty() {
            continue;
        }
        if seen.insert(host.clone()) {
            merged.push(host);
        }
    }

    merged
}
