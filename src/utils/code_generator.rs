use rand::Rng;

/// 礼品卡前缀
pub const GIFT_CARD_PREFIX: &str = "GC-";
/// 促销礼券前缀
pub const PROMO_GIFT_PREFIX: &str = "PG-";

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_BODY_LEN: usize = 8;

/// 生成 8 位字母数字组合（不做唯一性检查）
fn random_code_body() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_BODY_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// 生成礼品卡号 GC-XXXXXXXX
pub fn generate_gift_card_code() -> String {
    format!("{GIFT_CARD_PREFIX}{}", random_code_body())
}

/// 生成促销券码 PG-XXXXXXXX
pub fn generate_promo_gift_token() -> String {
    format!("{PROMO_GIFT_PREFIX}{}", random_code_body())
}

/// 规范化用户输入的卡号/券码: 去首尾空白 + 转大写
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

pub fn is_gift_card_code(normalized: &str) -> bool {
    normalized.starts_with(GIFT_CARD_PREFIX)
}

pub fn is_promo_gift_token(normalized: &str) -> bool {
    normalized.starts_with(PROMO_GIFT_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_gift_card_code() {
        let code = generate_gift_card_code();
        assert_eq!(code.len(), 11);
        assert!(is_gift_card_code(&code));
        assert!(
            code[3..]
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn test_generate_promo_gift_token() {
        let token = generate_promo_gift_token();
        assert_eq!(token.len(), 11);
        assert!(is_promo_gift_token(&token));
        assert!(!is_gift_card_code(&token));
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  gc-ab12cd34 \n"), "GC-AB12CD34");
        assert_eq!(normalize_code("PG-XYZ"), "PG-XYZ");
        // 规范化后前缀判断才可靠
        assert!(is_promo_gift_token(&normalize_code(" pg-abcdefgh")));
    }
}
