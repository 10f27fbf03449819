/*
 * Small HTTP greeting service for local use
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA <kgt9221@gmail.com>
 */

//!
//! 結合テスト用の共通ヘルパー
//!

use std::fs;
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::blocking::Client;

///
/// テスト用ディレクトリを準備する
///
/// # 戻り値
/// ベースディレクトリのパス
///
pub fn prepare_test_dir() -> PathBuf {
    let base = Path::new("tests").join("tmp").join(unique_suffix());
    fs::create_dir_all(&base).expect("create base dir failed");

    base
}

///
/// 一意なサフィックス文字列を生成する
///
/// # 戻り値
/// サフィックス文字列
///
pub fn unique_suffix() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let pid = std::process::id();
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time failed")
        .as_nanos();
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}-{}", pid, now, seq)
}

///
/// ローカル空きポートを確保する
///
/// # 戻り値
/// ポート番号
///
pub fn reserve_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .expect("bind failed");
    listener.local_addr().expect("addr failed").port()
}

///
/// APIサーバの起動を管理するガード
///
pub struct ServerGuard {
    child: Child,
}

impl ServerGuard {
    ///
    /// APIサーバを起動する
    ///
    /// # 引数
    /// * `port` - 待受ポート
    /// * `base_dir` - テスト用ベースディレクトリ
    ///
    /// # 戻り値
    /// ServerGuard
    ///
    pub fn start(port: u16, base_dir: &Path) -> Self {
        /*
         * サーバ起動
         */
        let exe = test_binary_path();
        let child = Command::new(exe)
            .env("XDG_CONFIG_HOME", base_dir)
            .env("XDG_DATA_HOME", base_dir)
            .arg("run")
            .arg(format!("127.0.0.1:{}", port))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn server failed");

        Self { child }
    }
}

impl Drop for ServerGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

///
/// サーバの起動完了を待機する
///
/// # 概要
/// 挨拶エンドポイントへのアクセスはカウンタを進めてしまうため、待受ポートへ
/// のTCP接続の成立によって起動完了を判定する。
///
/// # 引数
/// * `port` - 待受ポート
///
/// # 戻り値
/// なし
///
pub fn wait_for_server(port: u16) {
    /*
     * 起動確認
     */
    for _ in 0..50 {
        if TcpStream::connect(("127.0.0.1", port)).is_ok() {
            return;
        }

        thread::sleep(Duration::from_millis(100));
    }

    panic!("server did not start");
}

///
/// HTTPクライアントを生成する
///
/// # 戻り値
/// HTTPクライアント
///
pub fn build_client() -> Client {
    Client::builder()
        .timeout(Duration::from_millis(7000))
        .build()
        .expect("client build failed")
}

///
/// テスト用ベースURLを生成する
///
/// # 引数
/// * `port` - 待受ポート
///
/// # 戻り値
/// ベースURL文字列
///
#[allow(dead_code)]
pub fn base_url(port: u16) -> String {
    format!("http://127.0.0.1:{}", port)
}

///
/// テスト実行バイナリを取得する
///
/// # 戻り値
/// 実行バイナリのパス
///
pub fn test_binary_path() -> PathBuf {
    if let Some(exe) = std::env::var_os("CARGO_BIN_EXE_aisatsu") {
        return PathBuf::from(exe);
    }

    let mut path = std::env::current_exe().expect("current exe missing");
    path.pop(); // deps
    path.pop(); // debug
    path.push("aisatsu");
    if cfg!(windows) {
        path.set_extension("exe");
    }

    if !path.exists() {
        panic!("aisatsu binary not found: {}", path.display());
    }

    path
}
