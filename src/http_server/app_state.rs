/*
 * Small HTTP greeting service for local use
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA <kgt9221@gmail.com>
 */

//!
//! HTTPサーバが共有する状態をまとめたモジュール
//!

use std::sync::atomic::{AtomicU64, Ordering};

///
/// HTTPサーバの共有状態
///
pub(crate) struct AppState {
    /// 挨拶レスポンスへ採番するカウンタ
    greeting_counter: AtomicU64,
}

impl AppState {
    ///
    /// 共有状態オブジェクトの生成
    ///
    /// # 戻り値
    /// カウンタを初期状態とした共有状態オブジェクトを返す。
    ///
    pub(crate) fn new() -> Self {
        Self {
            greeting_counter: AtomicU64::new(0),
        }
    }

    ///
    /// 挨拶ID用カウンタの採番
    ///
    /// # 概要
    /// プロセス内で一意かつ単調増加するIDを払い出す。採番はアトミックに行われ
    /// るため、並行呼び出しで同一の値が重複することはない。最初の呼び出しは1
    /// を返す。
    ///
    /// # 戻り値
    /// 採番したID
    ///
    pub(crate) fn next_greeting_id(&self) -> u64 {
        self.greeting_counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    ///
    /// カウンタが1から順に採番されることを確認する。
    ///
    #[test]
    fn counter_starts_at_one_and_increments() {
        let state = AppState::new();

        assert_eq!(state.next_greeting_id(), 1);
        assert_eq!(state.next_greeting_id(), 2);
        assert_eq!(state.next_greeting_id(), 3);
    }

    ///
    /// 並行採番でIDが重複しないことを確認する。
    ///
    /// # 注記
    /// 8スレッドから各100回採番し、払い出された値の集合が1..=800と一致する
    /// ことを検証する。
    ///
    #[test]
    fn counter_is_unique_under_concurrency() {
        let state = Arc::new(AppState::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let state = state.clone();
            handles.push(thread::spawn(move || {
                let mut ids = Vec::with_capacity(100);
                for _ in 0..100 {
                    ids.push(state.next_greeting_id());
                }
                ids
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.extend(handle.join().expect("join failed"));
        }

        ids.sort_unstable();
        let expected: Vec<u64> = (1..=800).collect();
        assert_eq!(ids, expected);
    }
}
