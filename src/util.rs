pub fn format_count(value: u64) -> String {
    const UNITS: [&str; 4] = ["", "k", "M", "B"];

    let mut scaled = value as f64;
    let mut unit = 0usize;
    while scaled >= 1000.0 && unit < UNITS.len() - 1 {
        scaled /= 1000.0;
        unit += 1;
    }

    if unit == 0 {
        value.to_string()
    } else {
        format!("{scaled:.1}{}", UNITS[unit])
    }
}

pub fn short_name(id: &str) -> &str {
    id.split_once('/').map(|(_, rest)| rest).unwrap_or(id)
}

pub fn owner_of(id: &str) -> &str {
    match id.find('/') {
        Some(slash) if slash > 0 => &id[..slash],
        _ => id,
    }
}
