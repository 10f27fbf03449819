/*
 * Small HTTP greeting service for local use
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA <kgt9221@gmail.com>
 */

//!
//! REST APIの実装を集約するモジュール
//!

pub(crate) mod greeting;

use actix_web::http::header;
use actix_web::HttpResponse;
use serde_json::json;

/// キャッシュを禁止させる場合のCache-Controlヘッダのテンプレート
const NO_CACHE_TEMPLATE: &str = concat!(
    "no-store, ",
    "no-cache, ",
    "must-revalidate, ",
    "max-age=0",
);

///
/// JSON形式のエラーレスポンスを返す場合のレスポンスビルド関数
///
/// # 引数
/// * `status` - ステータスコード
/// * `reason` - エラー理由
///
/// # 戻り値
/// レスポンスオブジェクト
///
fn resp_error_json<S>(status: actix_web::http::StatusCode, reason: S)
    -> HttpResponse
where
    S: ToString,
{
    let body = json!({
        "reason": reason.to_string(),
    });

    HttpResponse::build(status)
        .insert_header((header::CACHE_CONTROL, NO_CACHE_TEMPLATE))
        .content_type("application/json")
        .body(body.to_string())
}
