/// 本國上市證券國際證券辨識號碼一覽表
pub mod international_securities_identification_number;
/// 個股日成交資訊
pub mod stock_day;
