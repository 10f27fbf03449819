/*
 * Small HTTP greeting service for local use
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA <kgt9221@gmail.com>
 */

//!
//! コンフィギュレーション情報の定義
//!

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::LogLevel;

///
/// コンフィギュレーションデータを集約する構造体
///
#[derive(Debug, Default, Deserialize, Serialize)]
pub(super) struct Config {
    /// グローバルオプションに対する情報
    global: Option<GlobalInfo>,

    /// runサブコマンド用の設定
    run: Option<RunInfo>,
}

///
/// グローバルオプションに対応する設定情報
///
#[derive(Debug, Default, Deserialize, Serialize)]
struct GlobalInfo {
    /// 記録するログレベル
    log_level: Option<LogLevel>,

    /// ログの出力先ディレクトリ
    log_output: Option<PathBuf>,

    /// ログの標準出力同時出力フラグ
    log_tee: Option<bool>,
}

///
/// runサブコマンドに対応する設定情報
///
#[derive(Debug, Default, Deserialize, Serialize)]
struct RunInfo {
    /// サーバのバインド先アドレス
    bind_addr: Option<String>,

    /// サーバのバインド先ポート番号
    bind_port: Option<u16>,
}

impl Config {
    ///
    /// コンフィギュレーションファイルの読み込み
    ///
    /// # 引数
    /// * `path` - 読み込み対象のファイルパス
    ///
    /// # 戻り値
    /// 読み込んだコンフィギュレーション情報を返す。
    ///
    pub(super) fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        let config = toml::from_str(&source)?;

        Ok(config)
    }

    ///
    /// コンフィギュレーションファイルの保存
    ///
    /// # 引数
    /// * `path` - 保存先のファイルパス
    ///
    /// # 戻り値
    /// 保存に成功した場合は`Ok(())`を返す。
    ///
    pub(super) fn save(&self, path: &Path) -> Result<()> {
        let source = toml::to_string(self)?;
        fs::write(path, source)?;

        Ok(())
    }

    ///
    /// グローバル設定のログレベルへのアクセサ
    ///
    pub(super) fn log_level(&self) -> Option<LogLevel> {
        self.global.as_ref()?.log_level
    }

    ///
    /// グローバル設定のログ出力先へのアクセサ
    ///
    pub(super) fn log_output(&self) -> Option<PathBuf> {
        self.global.as_ref()?.log_output.clone()
    }

    ///
    /// グローバル設定のログ同時出力フラグへのアクセサ
    ///
    pub(super) fn log_tee(&self) -> Option<bool> {
        self.global.as_ref()?.log_tee
    }

    ///
    /// runサブコマンドのバインドアドレスへのアクセサ
    ///
    pub(super) fn run_bind_addr(&self) -> Option<String> {
        self.run.as_ref()?.bind_addr.clone()
    }

    ///
    /// runサブコマンドのバインドポートへのアクセサ
    ///
    pub(super) fn run_bind_port(&self) -> Option<u16> {
        self.run.as_ref()?.bind_port
    }

    ///
    /// グローバル設定のログレベルを更新
    ///
    pub(super) fn set_log_level(&mut self, level: LogLevel) {
        let global = self.ensure_global();
        global.log_level = Some(level);
    }

    ///
    /// グローバル設定のログ出力先を更新
    ///
    pub(super) fn set_log_output(&mut self, path: PathBuf) {
        let global = self.ensure_global();
        global.log_output = Some(path);
    }

    ///
    /// グローバル設定のログ同時出力フラグを更新
    ///
    pub(super) fn set_log_tee(&mut self, tee: bool) {
        let global = self.ensure_global();
        global.log_tee = Some(tee);
    }

    ///
    /// runサブコマンドのバインドアドレスを更新
    ///
    pub(super) fn set_run_bind_addr(&mut self, addr: String) {
        let run = self.ensure_run();
        run.bind_addr = Some(addr);
    }

    ///
    /// runサブコマンドのバインドポートを更新
    ///
    pub(super) fn set_run_bind_port(&mut self, port: u16) {
        let run = self.ensure_run();
        run.bind_port = Some(port);
    }

    ///
    /// グローバル設定セクションの取得(未定義の場合は生成)
    ///
    fn ensure_global(&mut self) -> &mut GlobalInfo {
        self.global.get_or_insert_with(GlobalInfo::default)
    }

    ///
    /// runセクションの取得(未定義の場合は生成)
    ///
    fn ensure_run(&mut self) -> &mut RunInfo {
        self.run.get_or_insert_with(RunInfo::default)
    }
}
