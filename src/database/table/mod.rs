/// 每月成交資訊的補齊紀錄
pub mod completion_record;
/// 個股日成交資訊
pub mod daily_trading;
/// 有價證券的上市資訊
pub mod stock_info;
