use rand::{Rng, RngExt};

const FIREFOX_VERSIONS: [&str; 12] = [
    "133.0", "132.0", "131.0", "130.0", "129.0", "128.0", "127.0", "126.0", "125.0", "124.0",
    "123.0", "122.0",
];

const CHROME_VERSIONS: [&str; 12] = [
    "133.0.6943.98",
    "133.0.6943.60",
    "132.0.6834.110",
    "132.0.6834.83",
    "131.0.6778.108",
    "131.0.6778.85",
    "130.0.6723.117",
    "130.0.6723.92",
    "129.0.6668.89",
    "128.0.6613.138",
    "127.0.6533.119",
    "126.0.6478.182",
];

const DESKTOP_OS: [&str; 6] = [
    "Windows NT 10.0; Win64; x64",
    "Windows NT 11.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "Macintosh; Intel Mac OS X 14_3",
    "X11; Linux x86_64",
    "X11; Ubuntu; Linux x86_64",
];

fn pick<'a>(rng: &mut impl Rng, candidates: &[&'a str]) -> &'a str {
    candidates[rng.random_range(..candidates.len())]
}

fn gen_firefox_ua(rng: &mut impl Rng) -> String {
    let version = pick(rng, &FIREFOX_VERSIONS);
    let os = pick(rng, &DESKTOP_OS);
    format!(
        "Mozilla/5.0 ({}; rv:{}) Gecko/20100101 Firefox/{}",
        os, version, version
    )
}

fn gen_chrome_ua(rng: &mut impl Rng) -> String {
    let version = pick(rng, &CHROME_VERSIONS);
    let os = pick(rng, &DESKTOP_OS);
    format!(
        "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36",
        os, version
    )
}

/// 隨機產生一個桌面瀏覽器的 User-Agent
pub fn gen_random_ua() -> String {
    let mut rng = rand::rng();
    if rng.random_bool(0.5) {
        gen_chrome_ua(&mut rng)
    } else {
        gen_firefox_ua(&mut rng)
    }
}
