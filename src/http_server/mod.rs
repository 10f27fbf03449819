/*
 * Small HTTP greeting service for local use
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA <kgt9221@gmail.com>
 */

//!
//! HTTPサーバに関する処理を集約するモジュール
//!

pub(crate) mod app_state;
pub(crate) mod logger;

use anyhow::Result;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use log::info;
use tokio::runtime::Builder;

use crate::rest_api;

use self::app_state::AppState;
use self::logger::AccessLogger;

pub(crate) fn run(addr: String, port: u16) -> Result<()> {
    /*
     * Tokioランタイムの構築
     */
    let rt = Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("tokio runtime failed");

    /*
     * サーバインスタンスの生成
     */
    let state = web::Data::new(AppState::new());
    let server = create_server(addr, port, state)?;

    /*
     * Tokioランタイムでのサーバの起動
     */
    info!("HTTP server start");

    match rt.block_on(async {server.await}) {
        Ok(()) => {
            info!("HTTP server exit");
            Ok(())
        }

        Err(err) => {
            info!("HTTP server failed");
            Err(err.into())
        }
    }
}

///
/// HTTPサーバーの生成
///
/// # 引数
/// * `addr` - サーバーをバインドさせるアドレス
/// * `port` - サーバーをバインドさせるポート番号
/// * `state` - 共有状態
///
fn create_server(
    addr: String,
    port: u16,
    state: web::Data<AppState>,
) -> Result<Server> {
    let server = HttpServer::new(move || {
        App::new()
            // ロガーの設定
            .wrap(AccessLogger::new())

            // 共有状態の設定
            .app_data(state.clone())

            // 挨拶APIエンドポイント設定
            .route("/greeting", web::get().to(rest_api::greeting::get))
            .route(
                "/greeting-javaconfig",
                web::get().to(rest_api::greeting::get_javaconfig),
            )
    })
    .bind(format!("{}:{}", addr, port))?;

    Ok(server.run())
}
