use anyhow::{Result, bail};
use std::io::{BufRead, Write};

/// 反复询问，直到输入非空的地址
pub fn ask_url<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<String> {
    loop {
        let line = ask(input, output, "请输入要滚动的网址: ")?;
        if !line.is_empty() {
            return Ok(line);
        }
        writeln!(output, "请输入有效的网址。")?;
    }
}

/// 询问是否下载图片，只接受 y/yes/1 与 n/no/0
pub fn ask_download<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<bool> {
    loop {
        let line = ask(input, output, "滚动时下载图片并生成 PDF？(y/n): ")?;
        match line.to_lowercase().as_str() {
            "y" | "yes" | "1" => return Ok(true),
            "n" | "no" | "0" => return Ok(false),
            _ => writeln!(output, "请输入 y 或 n。")?,
        }
    }
}

/// 提示并等待回车
pub fn wait_for_enter<R: BufRead, W: Write>(input: &mut R, output: &mut W, message: &str) -> Result<()> {
    write!(output, "{}", message)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(())
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, message: &str) -> Result<String> {
    write!(output, "{}", message)?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("输入已结束");
    }
    Ok(line.trim().to_string())
}
