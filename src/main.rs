use anyhow::{bail, Context, Result};
use dictant_client::utils::logging;
use dictant_client::{App, Config, StudentCredentials};
use tokio::io::BufReader;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置：优先 DICTANT_CONFIG 指向的 TOML 文件
    let config = match std::env::var("DICTANT_CONFIG") {
        Ok(path) => Config::load(&path).with_context(|| format!("加载配置失败: {}", path))?,
        Err(_) => Config::from_env(),
    };
    config.validate()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    let credentials = read_credentials()?;

    // 初始化并运行应用
    let mut app = App::initialize(config).await?;
    let receipt = app
        .run(&credentials, BufReader::new(tokio::io::stdin()))
        .await?;

    // 进程退出前等待后台发送结束，发送结果已在任务内记录
    info!("等待答卷发送完成...");
    if let Err(e) = receipt.dispatch.await {
        warn!("发送任务异常结束: {}", e);
    }

    Ok(())
}

/// 命令行 `<考试码> <方向> <姓名...>`，缺省时读取环境变量
fn read_credentials() -> Result<StudentCredentials> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() >= 3 {
        return Ok(StudentCredentials::new(
            args[2..].join(" "),
            args[1].clone(),
            args[0].clone(),
        ));
    }

    let var = |name: &str| std::env::var(name).unwrap_or_default();
    let credentials = StudentCredentials::new(
        var("DICTANT_STUDENT_NAME"),
        var("DICTANT_GROUP"),
        var("DICTANT_CODE"),
    );
    if credentials.code.is_empty() {
        bail!("用法: dictant_client <考试码> <方向> <姓名>，或设置 DICTANT_CODE / DICTANT_GROUP / DICTANT_STUDENT_NAME");
    }
    Ok(credentials)
}
