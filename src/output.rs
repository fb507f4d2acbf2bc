use std::fs::File;
use std::io::Write;
use std::path::Path;

use colored::*;
use log::info;

use crate::error::Result;
use crate::input::OutputFormat;
use crate::model::{ResolutionRecord, RunResult};

/// 渲染结果为字符串
pub fn render(result: &RunResult, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => Ok(export_to_csv(result)),
        OutputFormat::Txt => Ok(export_to_txt(result)),
        OutputFormat::Table => Ok(export_to_table(result)),
    }
}

/// 输出结果，指定路径时写入文件，否则打印到终端
pub fn export_results(result: &RunResult, output_path: Option<&str>, format: &OutputFormat) -> Result<()> {
    let content = render(result, format)?;

    match output_path {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(content.as_bytes())?;
            info!("结果已导出到: {}", path);
        }
        None => println!("{}", content),
    }
    Ok(())
}

/// 根据输出文件扩展名推断格式，无法推断时使用 `fallback`
pub fn infer_format(output_path: Option<&str>, fallback: OutputFormat) -> OutputFormat {
    output_path
        .and_then(|path| Path::new(path).extension())
        .and_then(|ext| ext.to_str())
        .and_then(|ext| match ext.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "csv" => Some(OutputFormat::Csv),
            "txt" => Some(OutputFormat::Txt),
            _ => None,
        })
        .unwrap_or(fallback)
}

fn ip_field(record: &ResolutionRecord) -> String {
    if record.ip.is_empty() {
        "N/A".to_string()
    } else {
        record.ip.join(",")
    }
}

fn status_field(record: &ResolutionRecord) -> &'static str {
    if record.resolved {
        "Resolved"
    } else {
        "Failed"
    }
}

/// 导出为CSV格式
fn export_to_csv(result: &RunResult) -> String {
    let mut csv = String::new();
    csv.push_str("SUBDOMAIN,IP_ADDRESS,STATUS,HTTP_CODE,TITLE\n");
    for record in &result.subdomains {
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            escape_csv(&record.subdomain),
            escape_csv(&ip_field(record)),
            status_field(record),
            record.status_code.map_or(String::new(), |s| s.to_string()),
            escape_csv(record.title.as_deref().unwrap_or(""))
        ));
    }
    csv
}

/// 导出为TXT格式
fn export_to_txt(result: &RunResult) -> String {
    let mut txt = String::new();

    txt.push_str(&format!("Shunya Scan Results for {}\n", result.domain));
    txt.push_str(&format!("Generated at: {}\n\n", result.timestamp.to_rfc3339()));
    txt.push_str("=== SUBDOMAINS ===\n");
    for record in &result.subdomains {
        txt.push_str(&format!(
            "{} - {} - {} - {} - {}\n",
            record.subdomain,
            ip_field(record),
            status_field(record),
            record.status_code.map_or("N/A".to_string(), |s| s.to_string()),
            record.title.as_deref().unwrap_or("")
        ));
    }

    if let Some(geoip) = &result.geoip {
        txt.push_str("\n=== GEOIP ===\n");
        for (ip, geo) in geoip {
            match geo {
                Some(geo) => txt.push_str(&format!(
                    "{} - {}, {} - {} - {}\n",
                    ip, geo.country, geo.city, geo.asn, geo.org
                )),
                None => txt.push_str(&format!("{} - N/A\n", ip)),
            }
        }
    }

    if let Some(findings) = &result.dirscan {
        txt.push_str("\n=== DIRECTORIES ===\n");
        for finding in findings {
            txt.push_str(&format!("[{}] {} ({} bytes)\n", finding.status, finding.url, finding.length));
        }
    }

    txt
}

/// 终端表格
fn export_to_table(result: &RunResult) -> String {
    let mut out = String::new();

    for record in &result.subdomains {
        let status = match record.status_code {
            Some(code) => format!("[{}]", code).yellow(),
            None => "[N/A]".dimmed(),
        };
        let title = record
            .title
            .as_ref()
            .map(|t| format!("- {}", t).cyan().to_string())
            .unwrap_or_default();
        out.push_str(&format!("{} {} {}\n", record.subdomain.bright_green(), status, title));
    }

    if let Some(findings) = &result.dirscan {
        out.push_str(&format!("\n{}\n", "Directories".bold()));
        for finding in findings {
            out.push_str(&format!("{} {}\n", format!("[{}]", finding.status).yellow(), finding.url));
        }
    }

    out.push_str(&format!("\n{}\n", "Summary".bold()));
    out.push_str(&format!(
        "Total Subdomains: {}\n",
        result.subdomains.len().to_string().blue()
    ));
    out.push_str(&format!("Resolved: {}\n", result.resolved_count().to_string().green()));
    out.push_str(&format!("Failed: {}\n", result.failed_count().to_string().red()));
    out
}

/// CSV转义
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
