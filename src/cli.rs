//! 命令行参数

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "test-case-tagger")]
#[command(version)]
#[command(about = "对测试用例进行分类并管理分类历史", long_about = None)]
pub struct Cli {
    /// TOML 配置文件（环境变量优先于文件）
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// 显示详细日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 分类一批测试用例并保存到历史
    Classify(ClassifyArgs),
    /// 分页查看历史记录
    History(HistoryArgs),
    /// 删除当前用户的全部历史记录
    Erase(EraseArgs),
}

/// 历史记录按用户隔离
#[derive(Args, Debug)]
pub struct UserArg {
    /// 用户 ID
    #[arg(long)]
    pub user: String,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false, id = "source")]
pub struct ClassifySource {
    /// 逗号分隔的测试用例
    #[arg(long)]
    pub text: Option<String>,

    /// 含 "Text" 列的 CSV 文件
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub user: UserArg,

    #[command(flatten)]
    pub source: ClassifySource,

    /// 把结果导出为 CSV
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    #[command(flatten)]
    pub user: UserArg,

    /// 只看某一天（YYYY-MM-DD，当地时间）
    #[arg(long)]
    pub date: Option<String>,

    /// 加载的页数
    #[arg(long, default_value_t = 1, conflicts_with = "all")]
    pub pages: usize,

    /// 加载全部记录
    #[arg(long)]
    pub all: bool,

    /// 把已加载的记录导出为 CSV
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EraseArgs {
    #[command(flatten)]
    pub user: UserArg,

    /// 跳过确认
    #[arg(long)]
    pub yes: bool,
}
