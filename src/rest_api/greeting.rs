/*
 * Small HTTP greeting service for local use
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA <kgt9221@gmail.com>
 */

//!
//! 挨拶APIの実装を行うモジュール
//!

use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Local;
use log::info;
use serde::{Deserialize, Serialize};

use crate::http_server::app_state::AppState;
use super::{resp_error_json, NO_CACHE_TEMPLATE};

/// クロスオリジンアクセスを許可するオリジン
const ALLOWED_ORIGIN: &str = "http://localhost:8080";

/// nameパラメータ省略時に使用する名前
const DEFAULT_NAME: &str = "World";

///
/// 挨拶レスポンスを表す構造体
///
/// # 概要
/// リクエスト毎に生成され、レスポンスボディへシリアライズした後は破棄され
/// る。`id`はプロセス内で一意かつ単調増加する。
///
#[derive(Debug, Serialize)]
struct Greeting {
    /// レスポンスの通し番号
    id: u64,

    /// 挨拶メッセージ本文
    content: String,
}

impl Greeting {
    ///
    /// 挨拶レスポンスの生成
    ///
    /// # 引数
    /// * `id` - 採番済みの通し番号
    /// * `name` - 挨拶の対象となる名前
    ///
    /// # 戻り値
    /// 生成した挨拶レスポンスを返す。
    ///
    fn new(id: u64, name: &str) -> Self {
        Self {
            id,
            content: format!("Hello, {}!", name),
        }
    }
}

///
/// クエリーパラメータを格納する構造体
///
#[derive(Deserialize)]
struct GreetingQuery {
    name: Option<String>,
}

///
/// ルート毎の挙動を指定する構造体
///
struct RouteBehavior {
    /// クロスオリジンヘッダを処理するか否か
    handle_cors: bool,

    /// リクエストのログを出力するか否か
    emit_log: bool,
}

/// GET /greeting の挙動
const DEFAULT_ROUTE: RouteBehavior = RouteBehavior {
    handle_cors: true,
    emit_log: true,
};

/// GET /greeting-javaconfig の挙動
const JAVACONFIG_ROUTE: RouteBehavior = RouteBehavior {
    handle_cors: false,
    emit_log: false,
};

///
/// GET /greeting の実体
///
/// # 概要
/// クエリーパラメータ`name`(省略時は"World")に対する挨拶メッセージと、プロ
/// セス内で一意の通し番号を返す。許可済みオリジンからのクロスオリジンアクセ
/// スを受け付け、リクエスト時刻をログへ記録する。
///
/// # 引数
/// * `req` - HTTPリクエスト
/// * `state` - 共有状態
///
/// # APIレスポンスの種別
/// application/json
///
/// # 戻り値
/// actix-webのレスポンスオブジェクト
///
pub async fn get(
    req: HttpRequest,
    state: web::Data<AppState>,
)
    -> actix_web::Result<HttpResponse>
{
    Ok(respond(&req, &state, &DEFAULT_ROUTE))
}

///
/// GET /greeting-javaconfig の実体
///
/// # 概要
/// GET /greetingと同一のレスポンスを返す。クロスオリジンヘッダの付与とログ
/// 出力は行わない。通し番号のカウンタはGET /greetingと共有する。
///
/// # 引数
/// * `req` - HTTPリクエスト
/// * `state` - 共有状態
///
/// # APIレスポンスの種別
/// application/json
///
/// # 戻り値
/// actix-webのレスポンスオブジェクト
///
pub async fn get_javaconfig(
    req: HttpRequest,
    state: web::Data<AppState>,
)
    -> actix_web::Result<HttpResponse>
{
    Ok(respond(&req, &state, &JAVACONFIG_ROUTE))
}

///
/// 挨拶レスポンスのビルド処理
///
/// # 引数
/// * `req` - HTTPリクエスト
/// * `state` - 共有状態
/// * `behavior` - ルート毎の挙動指定
///
/// # 戻り値
/// レスポンスオブジェクト
///
fn respond(
    req: &HttpRequest,
    state: &AppState,
    behavior: &RouteBehavior,
) -> HttpResponse {
    /*
     * オリジンの検証
     */
    let origin = if behavior.handle_cors {
        match check_origin(req) {
            Ok(origin) => origin,
            Err(resp) => return resp,
        }
    } else {
        None
    };

    /*
     * クエリ取得と検証
     */
    let query = match web::Query::<GreetingQuery>::from_query(
        req.query_string()
    ) {
        Ok(query) => query,
        Err(_) => {
            return resp_error_json(
                StatusCode::BAD_REQUEST,
                "invalid query parameter: name",
            );
        }
    };

    /*
     * リクエストのログ出力
     */
    if behavior.emit_log {
        println!("==== in greeting ====");
        info!("Request at {}", Local::now());
    }

    /*
     * 挨拶レスポンスの生成
     */
    let greeting = Greeting::new(
        state.next_greeting_id(),
        resolve_name(query.name.as_deref()),
    );

    let body = match serde_json::to_string(&greeting) {
        Ok(body) => body,
        Err(_) => {
            return resp_error_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                "serialize failed",
            );
        }
    };

    /*
     * レスポンスの組み立て
     */
    let mut builder = HttpResponse::Ok();
    builder
        .insert_header((header::CACHE_CONTROL, NO_CACHE_TEMPLATE))
        .content_type("application/json");

    if let Some(origin) = origin {
        builder.insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, origin));
        builder.insert_header((header::VARY, "Origin"));
    }

    builder.body(body)
}

///
/// クロスオリジンアクセスの検証
///
/// # 概要
/// Originヘッダが存在しない場合、またはOriginが自サーバのオリジンと一致する
/// 場合はクロスオリジンリクエストではないためそのまま許可する。それ以外は許
/// 可リストと照合し、一致しないオリジンからのリクエストは拒否する。
///
/// # 引数
/// * `req` - HTTPリクエスト
///
/// # 戻り値
/// レスポンスへ反映するオリジン文字列を返す。クロスオリジンリクエストでない
/// 場合は`Ok(None)`を返す。拒否する場合はエラーレスポンスを`Err()`でラップし
/// て返す。
///
fn check_origin(req: &HttpRequest) -> Result<Option<String>, HttpResponse> {
    let origin = match req.headers().get(header::ORIGIN) {
        Some(origin) => origin,
        None => return Ok(None),
    };

    let value = match origin.to_str() {
        Ok(value) => value,
        Err(_) => {
            return Err(resp_error_json(
                StatusCode::FORBIDDEN,
                "origin not allowed",
            ));
        }
    };

    /*
     * 自オリジンへのリクエストはCORS対象外
     */
    let info = req.connection_info();
    let own_origin = format!("{}://{}", info.scheme(), info.host());
    if value == own_origin {
        return Ok(None);
    }

    /*
     * 許可リストとの照合
     */
    if value == ALLOWED_ORIGIN {
        Ok(Some(value.to_string()))
    } else {
        Err(resp_error_json(
            StatusCode::FORBIDDEN,
            "origin not allowed",
        ))
    }
}

///
/// 挨拶対象の名前の決定
///
/// # 概要
/// パラメータが未指定または空文字列の場合はデフォルトの名前へ置き換える。
/// それ以外の値は変換を行わずそのまま使用する。
///
/// # 引数
/// * `name` - クエリーパラメータ値
///
/// # 戻り値
/// 挨拶の対象となる名前
///
fn resolve_name(name: Option<&str>) -> &str {
    match name {
        Some(value) if !value.is_empty() => value,
        _ => DEFAULT_NAME,
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::*;

    ///
    /// 名前の置き換えが期待通りに動作することを確認する。
    ///
    #[test]
    fn resolve_name_substitutes_default() {
        assert_eq!(resolve_name(None), "World");
        assert_eq!(resolve_name(Some("")), "World");
        assert_eq!(resolve_name(Some("Ada")), "Ada");
        assert_eq!(resolve_name(Some(" ")), " ");
    }

    ///
    /// 挨拶メッセージの組み立てが期待通りに動作することを確認する。
    ///
    /// # 注記
    /// 名前は変換やエスケープを行わずそのまま埋め込まれる。
    ///
    #[test]
    fn greeting_formats_content_verbatim() {
        let greeting = Greeting::new(1, "World");
        assert_eq!(greeting.id, 1);
        assert_eq!(greeting.content, "Hello, World!");

        let greeting = Greeting::new(2, "世界");
        assert_eq!(greeting.content, "Hello, 世界!");

        let long_name = "x".repeat(4096);
        let greeting = Greeting::new(3, &long_name);
        assert_eq!(greeting.content, format!("Hello, {}!", long_name));
    }

    ///
    /// 挨拶レスポンスのシリアライズ結果を確認する。
    ///
    #[test]
    fn greeting_serializes_to_json() {
        let greeting = Greeting::new(42, "Ada");
        let body = serde_json::to_string(&greeting)
            .expect("serialize failed");
        let value: serde_json::Value = serde_json::from_str(&body)
            .expect("parse failed");

        assert_eq!(value["id"], 42);
        assert_eq!(value["content"], "Hello, Ada!");
    }

    ///
    /// クエリーパラメータの取得が期待通りに動作することを確認する。
    ///
    #[test]
    fn greeting_query_binds_optional_name() {
        let query = web::Query::<GreetingQuery>::from_query("")
            .expect("bind failed");
        assert_eq!(query.name, None);

        let query = web::Query::<GreetingQuery>::from_query("name=Ada")
            .expect("bind failed");
        assert_eq!(query.name.as_deref(), Some("Ada"));

        let query = web::Query::<GreetingQuery>::from_query("name=")
            .expect("bind failed");
        assert_eq!(query.name.as_deref(), Some(""));
    }

    ///
    /// 不正なクエリーパラメータが拒否されることを確認する。
    ///
    #[test]
    fn greeting_query_rejects_duplicate_name() {
        assert!(
            web::Query::<GreetingQuery>::from_query("name=a&name=b").is_err()
        );
    }

    ///
    /// オリジンの検証が期待通りに動作することを確認する。
    ///
    #[test]
    fn check_origin_applies_allowlist() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(check_origin(&req), Ok(None)));

        let req = TestRequest::default()
            .insert_header((header::ORIGIN, ALLOWED_ORIGIN))
            .to_http_request();
        match check_origin(&req) {
            Ok(Some(origin)) => assert_eq!(origin, ALLOWED_ORIGIN),
            _ => panic!("allowed origin was not accepted"),
        }

        let req = TestRequest::default()
            .insert_header((header::ORIGIN, "http://evil.example"))
            .to_http_request();
        match check_origin(&req) {
            Err(resp) => assert_eq!(resp.status(), StatusCode::FORBIDDEN),
            _ => panic!("forbidden origin was accepted"),
        }
    }

    ///
    /// 自オリジンへのリクエストがCORS対象外として許可されることを確認する。
    ///
    /// # 注記
    /// 許可リスト外のホストで待ち受けている場合でも、Originが自サーバのオリ
    /// ジンと一致するリクエストは拒否されず、許可ヘッダも付与されない。
    ///
    #[test]
    fn check_origin_passes_same_origin_request() {
        let req = TestRequest::with_uri("http://127.0.0.1:9090/greeting")
            .insert_header((header::ORIGIN, "http://127.0.0.1:9090"))
            .to_http_request();
        assert!(matches!(check_origin(&req), Ok(None)));

        let state = AppState::new();
        let resp = respond(&req, &state, &DEFAULT_ROUTE);
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}
