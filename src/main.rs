use std::process;

use clap::Parser;
use colored::*;
use log::error;

use shunya::input::Opts;
use shunya::logger::init_logger;
use shunya::output::{export_results, infer_format};
use shunya::ReconEngine;

#[tokio::main]
async fn main() {
    let opts = Opts::parse();
    init_logger(opts.log_level());

    // 配置错误在任何网络活动之前退出
    let engine = match ReconEngine::new(opts.to_config()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{} {}", "[-] 执行失败:".red().bold(), e);
            process::exit(1);
        }
    };

    if !opts.silent {
        println!("{}", format!("[+] Target: {}", engine.domain()).bright_green());
    }

    let result = engine.run().await;

    let format = infer_format(opts.output.as_deref(), opts.format);
    if let Err(e) = export_results(&result, opts.output.as_deref(), &format) {
        error!("结果输出失败: {}", e);
        process::exit(1);
    }

    if !opts.silent {
        println!("{}", "[+] Scan completed successfully!".green().bold());
    }
}
