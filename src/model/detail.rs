//! Event detail strings.
//!
//! A detail is a small JSON-like object of string pairs, e.g.
//! `{"weapon":"rifle", "range":"300"}`. Keys and values are sanitized so the
//! result never contains the structural characters of the encoding.

/// Stand-in key when there are more values than keys.
pub const NO_KEY: &str = "no_key";
/// Stand-in value when there are more keys than values.
pub const NO_VAL: &str = "no_val";

/// Empty key or value list, for events recorded without detail.
pub const NO_DETAIL: &[&str] = &[];

const RESERVED: [char; 6] = [':', ',', '{', '}', '"', ' '];

fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if RESERVED.contains(&c) { '_' } else { c })
        .collect()
}

/// Encode paired keys and values as a detail string.
///
/// The shorter side is padded with [`NO_KEY`] or [`NO_VAL`], so no value or
/// key is ever dropped silently.
pub fn encode_detail<K: AsRef<str>, V: AsRef<str>>(keys: &[K], vals: &[V]) -> String {
    let len = keys.len().max(vals.len());
    let mut out = String::from("{");
    for i in 0..len {
        if i > 0 {
            out.push_str(", ");
        }
        let key = keys.get(i).map_or(NO_KEY, |k| k.as_ref());
        let val = vals.get(i).map_or(NO_VAL, |v| v.as_ref());
        out.push('"');
        out.push_str(&sanitize(key));
        out.push_str("\":\"");
        out.push_str(&sanitize(val));
        out.push('"');
    }
    out.push('}');
    out
}

/// Encode one detail string per row from parallel value columns.
///
/// `value_columns[j]` holds the values for `keys[j]`. Rows run to the length
/// of the shortest column.
pub fn encode_detail_columns<K: AsRef<str>, V: AsRef<str>>(
    keys: &[K],
    value_columns: &[Vec<V>],
) -> Vec<String> {
    let rows = value_columns.iter().map(Vec::len).min().unwrap_or(0);
    (0..rows)
        .map(|r| {
            let vals: Vec<&str> = value_columns.iter().map(|col| col[r].as_ref()).collect();
            encode_detail(keys, &vals)
        })
        .collect()
}
