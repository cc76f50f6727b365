use crate::calculator::CalcError;
use crate::feed::FetchError;
use thiserror::Error;

/// ツール呼び出しのエラー
///
/// 「一致なし」はエラーではなく、正常な検索結果として返す。
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("未知のツール: {0}")]
    UnknownTool(String),
    /// 入力不正。フィードの取得前に検出される
    #[error("不正な引数: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("計算エラー: {0}")]
    Calculation(#[from] CalcError),
}
