//! 段落指纹
//!
//! 指纹由按字段名排序后的键值对规范序列化得到，与字段插入顺序无关。
//! 摘要只用于快速判定“不同”；摘要相同时再比较规范序列化本身，
//! 因此不存在碰撞导致漏翻译的可能。

use std::fmt;

use crate::sync::model::Section;

/// 段落指纹，按需计算，从不持久化
#[derive(Debug, Clone)]
pub struct SectionFingerprint {
    canonical: String,
    digest: blake3::Hash,
}

impl SectionFingerprint {
    /// 计算段落指纹
    pub fn of(section: &Section) -> Self {
        let canonical = canonical_form(section);
        let digest = blake3::hash(canonical.as_bytes());
        Self { canonical, digest }
    }

    /// 规范序列化
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// 摘要的十六进制前缀，用于日志
    pub fn short_hex(&self) -> String {
        self.digest.to_hex().as_str()[..12].to_string()
    }
}

impl PartialEq for SectionFingerprint {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest && self.canonical == other.canonical
    }
}

impl Eq for SectionFingerprint {}

impl fmt::Display for SectionFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_hex())
    }
}

/// 规范序列化：排序后的 `[key, value]` 数组的 JSON 形式
///
/// JSON 转义保证键值边界无歧义，序列化是确定且完全的。
fn canonical_form(section: &Section) -> String {
    let mut pairs: Vec<(&str, &str)> = section.iter().collect();
    pairs.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut out = String::with_capacity(pairs.iter().map(|(k, v)| k.len() + v.len() + 8).sum());
    out.push('[');
    for (i, (key, value)) in pairs.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push('[');
        push_json_string(&mut out, key);
        out.push(',');
        push_json_string(&mut out, value);
        out.push(']');
    }
    out.push(']');
    out
}

fn push_json_string(out: &mut String, s: &str) {
    // 字符串序列化不会失败；万一失败退回 Debug 形式，同样是无歧义的
    match serde_json::to_string(s) {
        Ok(quoted) => out.push_str(&quoted),
        Err(_) => out.push_str(&format!("{:?}", s)),
    }
}

/// 两个段落是否相同（按指纹）
pub fn sections_equal(a: &Section, b: &Section) -> bool {
    SectionFingerprint::of(a) == SectionFingerprint::of(b)
}
