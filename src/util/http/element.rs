use scraper::{ElementRef, Selector};

/// 元素內所有文字節點串接後去除前後空白
pub fn text_of(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// 以 CSS selector 找出第一個子元素的文字，selector 無效或找不到時為 `None`
pub fn parse_value(element: &ElementRef, css_selector: &str) -> Option<String> {
    let selector = Selector::parse(css_selector).ok()?;
    element.select(&selector).next().map(|v| text_of(&v))
}
