/// 台灣證券交易所
pub mod twse;
