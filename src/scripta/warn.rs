fn sanitize_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_sep = false;
    for ch in value.chars() {
        if ch.is_whitespace() {
            if !out.is_empty() && !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else if !ch.is_control() {
            out.push(ch);
            prev_sep = false;
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "na".to_string()
    } else {
        trimmed.to_string()
    }
}

pub struct WarnEvent<'a> {
    pub code: &'a str,
    pub stage: &'a str,
    pub file: &'a str,
    pub reason: &'a str,
    pub err: &'a str,
}

pub fn render(event: &WarnEvent<'_>) -> String {
    format!(
        "SCRIPTA_WARN code={} stage={} file={} reason={} err={}",
        sanitize_value(event.code),
        sanitize_value(event.stage),
        sanitize_value(event.file),
        sanitize_value(event.reason),
        sanitize_value(event.err),
    )
}

pub fn emit(event: WarnEvent<'_>) {
    eprintln!("{}", render(&event));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_value_rewrites_whitespace() {
        assert_eq!(sanitize_value("a b\tc"), "a_b_c");
    }

    #[test]
    fn sanitize_value_falls_back_for_empty() {
        assert_eq!(sanitize_value("   "), "na");
    }

    #[test]
    fn render_keeps_one_token_per_key() {
        let line = render(&WarnEvent {
            code: "INVALID_DATE",
            stage: "place",
            file: "/tmp/dropit/my scan.pdf",
            reason: "per-file-rejected",
            err: "invalid document date `2024-13-40`",
        });
        assert_eq!(
            line,
            "SCRIPTA_WARN code=INVALID_DATE stage=place file=/tmp/dropit/my_scan.pdf reason=per-file-rejected err=invalid_document_date_`2024-13-40`"
        );
    }
}
