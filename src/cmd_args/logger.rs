/*
 * Small HTTP greeting service for local use
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA <kgt9221@gmail.com>
 */

//!
//! ログ機能の初期化を行うモジュール
//!

use std::fs;
use std::sync::OnceLock;

use anyhow::{anyhow, Result};
use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, LogSpecBuilder, Logger,
    LoggerHandle, Naming,
};

use super::{LogLevel, Options};

/// ログローテーションを行うファイルサイズ(10MiB)
const ROTATE_SIZE: u64 = 10 * 1024 * 1024;

/// ローテーション後に保持するログファイル数
const KEEP_LOG_FILES: usize = 5;

/// ロガーハンドルの保持領域(ドロップするとロガーが停止するため保持する)
static LOGGER_HANDLE: OnceLock<LoggerHandle> = OnceLock::new();

///
/// ログ機能の初期化
///
/// # 概要
/// オプションで指定された出力先ディレクトリへのファイルロギングを開始する。
/// ログレベルにNONEが指定された場合は初期化を行わない。
///
/// # 引数
/// * `opts` - オプション情報をパックしたオブジェクト
///
/// # 戻り値
/// 初期化に成功した場合は`Ok(())`を返す。
///
pub(super) fn init(opts: &Options) -> Result<()> {
    /*
     * ログ抑止指定の判定
     */
    if opts.log_level() == LogLevel::None {
        return Ok(());
    }

    /*
     * 出力先ディレクトリの作成
     */
    let output_dir = opts.log_output();
    fs::create_dir_all(&output_dir)?;

    /*
     * ロガーの構築
     */
    let spec = LogSpecBuilder::new()
        .default(opts.log_level().into())
        .build();

    let mut logger = Logger::with(spec)
        .log_to_file(FileSpec::default().directory(&output_dir))
        .rotate(
            Criterion::Size(ROTATE_SIZE),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_LOG_FILES),
        )
        .format(flexi_logger::detailed_format);

    if opts.log_tee() {
        logger = logger.duplicate_to_stdout(Duplicate::All);
    }

    /*
     * ロガーの起動
     */
    let handle = logger.start()?;
    LOGGER_HANDLE
        .set(handle)
        .map_err(|_| anyhow!("logger already initialized"))?;

    Ok(())
}
