/// Document compatibility mode, decided by the DOCTYPE token (or its absence)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QuirksMode {
    #[default]
    NoQuirks,
    Quirks,
    LimitedQuirks,
}

/// Returns the compatibility mode for the given DOCTYPE
pub fn identify_quirks_mode(
    name: Option<&str>,
    public_id: Option<&str>,
    system_id: Option<&str>,
    force_quirks: bool,
) -> QuirksMode {
    if force_quirks || name != Some("html") {
        return QuirksMode::Quirks;
    }

    let starts_with_any = |value: &str, prefixes: &[&str]| prefixes.iter().any(|prefix| value.starts_with(prefix));

    if let Some(system_id) = system_id {
        if system_id.eq_ignore_ascii_case(QUIRKS_SYSTEM_ID) {
            return QuirksMode::Quirks;
        }
    }

    let Some(public_id) = public_id.map(str::to_ascii_lowercase) else {
        return QuirksMode::NoQuirks;
    };

    if QUIRKS_PUBLIC_ID_EXACT.contains(&public_id.as_str())
        || starts_with_any(&public_id, QUIRKS_PUBLIC_ID_PREFIX)
        || (system_id.is_none() && starts_with_any(&public_id, HTML401_PUBLIC_ID_PREFIX))
    {
        return QuirksMode::Quirks;
    }

    if starts_with_any(&public_id, LIMITED_QUIRKS_PUBLIC_ID_PREFIX)
        || (system_id.is_some() && starts_with_any(&public_id, HTML401_PUBLIC_ID_PREFIX))
    {
        return QuirksMode::LimitedQuirks;
    }

    QuirksMode::NoQuirks
}

/// A DOCTYPE is conforming when it is `<!DOCTYPE html>`, optionally with the
/// `about:legacy-compat` system identifier
pub fn is_conforming_doctype(name: Option<&str>, public_id: Option<&str>, system_id: Option<&str>) -> bool {
    if name != Some("html") {
        return false;
    }

    match public_id {
        None => system_id.map_or(true, |id| id == "about:legacy-compat"),
        Some(public_id) => OBSOLETE_PERMITTED_DOCTYPES
            .iter()
            .any(|(public, system, system_optional)| {
                public_id == *public && system_id.map_or(*system_optional, |id| id == *system)
            }),
    }
}

/// Obsolete permitted doctypes: public id, system id, and whether the system id may be left out
static OBSOLETE_PERMITTED_DOCTYPES: &[(&str, &str, bool)] = &[
    ("-//W3C//DTD HTML 4.0//EN", "http://www.w3.org/TR/REC-html40/strict.dtd", true),
    ("-//W3C//DTD HTML 4.01//EN", "http://www.w3.org/TR/html4/strict.dtd", true),
    ("-//W3C//DTD XHTML 1.0 Strict//EN", "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd", false),
    ("-//W3C//DTD XHTML 1.1//EN", "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd", false),
];

static QUIRKS_SYSTEM_ID: &str = "http://www.ibm.com/data/dtd/v11/ibmxhtml1-transitional.dtd";

static QUIRKS_PUBLIC_ID_EXACT: &[&str] = &[
    "-//w3o//dtd w3 html strict 3.0//en//",
    "-/w3c/dtd html 4.0 transitional/en",
    "html",
];

static QUIRKS_PUBLIC_ID_PREFIX: &[&str] = &[
    "+//silmaril//dtd html pro v0r11 19970101//",
    "-//as//dtd html 3.0 aswedit + extensions//",
    "-//advasoft ltd//dtd html 3.0 aswedit + extensions//",
    "-//ietf//dtd html 2.0 level 1//",
    "-//ietf//dtd html 2.0 level 2//",
    "-//ietf//dtd html 2.0 strict level 1//",
    "-//ietf//dtd html 2.0 strict level 2//",
    "-//ietf//dtd html 2.0 strict//",
    "-//ietf//dtd html 2.0//",
    "-//ietf//dtd html 2.1e//",
    "-//ietf//dtd html 3.0//",
    "-//ietf//dtd html 3.2 final//",
    "-//ietf//dtd html 3.2//",
    "-//ietf//dtd html 3//",
    "-//ietf//dtd html level 0//",
    "-//ietf//dtd html level 1//",
    "-//ietf//dtd html level 2//",
    "-//ietf//dtd html level 3//",
    "-//ietf//dtd html strict level 0//",
    "-//ietf//dtd html strict level 1//",
    "-//ietf//dtd html strict level 2//",
    "-//ietf//dtd html strict level 3//",
    "-//ietf//dtd html strict//",
    "-//ietf//dtd html//",
    "-//metrius//dtd metrius presentational//",
    "-//microsoft//dtd internet explorer 2.0 html strict//",
    "-//microsoft//dtd internet explorer 2.0 html//",
    "-//microsoft//dtd internet explorer 2.0 tables//",
    "-//microsoft//dtd internet explorer 3.0 html strict//",
    "-//microsoft//dtd internet explorer 3.0 html//",
    "-//microsoft//dtd internet explorer 3.0 tables//",
    "-//netscape comm. corp.//dtd html//",
    "-//netscape comm. corp.//dtd strict html//",
    "-//o'reilly and associates//dtd html 2.0//",
    "-//o'reilly and associates//dtd html extended 1.0//",
    "-//o'reilly and associates//dtd html extended relaxed 1.0//",
    "-//sq//dtd html 2.0 hotmetal + extensions//",
    "-//softquad software//dtd hotmetal pro 6.0::19990601::extensions to html 4.0//",
    "-//softquad//dtd hotmetal pro 4.0::19971010::extensions to html 4.0//",
    "-//spyglass//dtd html 2.0 extended//",
    "-//sun microsystems corp.//dtd hotjava html//",
    "-//sun microsystems corp.//dtd hotjava strict html//",
    "-//w3c//dtd html 3 1995-03-24//",
    "-//w3c//dtd html 3.2 draft//",
    "-//w3c//dtd html 3.2 final//",
    "-//w3c//dtd html 3.2//",
    "-//w3c//dtd html 3.2s draft//",
    "-//w3c//dtd html 4.0 frameset//",
    "-//w3c//dtd html 4.0 transitional//",
    "-//w3c//dtd html experimental 19960712//",
    "-//w3c//dtd html experimental 970421//",
    "-//w3c//dtd w3 html//",
    "-//w3o//dtd w3 html 3.0//",
    "-//webtechs//dtd mozilla html 2.0//",
    "-//webtechs//dtd mozilla html//",
];

/// HTML 4.01 frameset and transitional: quirks without a system identifier, limited quirks with one
static HTML401_PUBLIC_ID_PREFIX: &[&str] = &[
    "-//w3c//dtd html 4.01 frameset//",
    "-//w3c//dtd html 4.01 transitional//",
];

static LIMITED_QUIRKS_PUBLIC_ID_PREFIX: &[&str] = &[
    "-//w3c//dtd xhtml 1.0 frameset//",
    "-//w3c//dtd xhtml 1.0 transitional//",
];

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(None, None, None, false, QuirksMode::Quirks ; "missing name")]
    #[test_case(Some("html"), None, None, false, QuirksMode::NoQuirks ; "html5 doctype")]
    #[test_case(Some("html"), None, None, true, QuirksMode::Quirks ; "forced")]
    #[test_case(Some("HTML"), None, None, false, QuirksMode::Quirks ; "uppercase name")]
    #[test_case(Some("html"), None, Some("about:legacy-compat"), false, QuirksMode::NoQuirks ; "legacy compat")]
    #[test_case(Some("html"), Some("-//W3O//DTD W3 HTML Strict 3.0//EN//"), None, false, QuirksMode::Quirks ; "exact public id")]
    #[test_case(Some("html"), Some("-//IETF//DTD HTML 2.0//EN"), None, false, QuirksMode::Quirks ; "public id prefix")]
    #[test_case(Some("html"), Some("-//W3C//DTD HTML 4.01 Transitional//EN"), None, false, QuirksMode::Quirks ; "html401 without system id")]
    #[test_case(Some("html"), Some("-//W3C//DTD HTML 4.01 Transitional//EN"), Some("http://www.w3.org/TR/html4/loose.dtd"), false, QuirksMode::LimitedQuirks ; "html401 with system id")]
    #[test_case(Some("html"), Some("-//W3C//DTD XHTML 1.0 Transitional//EN"), None, false, QuirksMode::LimitedQuirks ; "xhtml transitional")]
    #[test_case(Some("html"), Some("-//W3C//DTD HTML 4.01//EN"), None, false, QuirksMode::NoQuirks ; "html401 strict")]
    #[test_case(Some("html"), None, Some("http://www.IBM.com/data/dtd/v11/ibmxhtml1-transitional.dtd"), false, QuirksMode::Quirks ; "ibm system id")]
    fn quirks_mode(name: Option<&str>, public_id: Option<&str>, system_id: Option<&str>, force: bool, expected: QuirksMode) {
        assert_eq!(identify_quirks_mode(name, public_id, system_id, force), expected);
    }

    #[test]
    fn conforming_doctypes() {
        assert!(is_conforming_doctype(Some("html"), None, None));
        assert!(is_conforming_doctype(Some("html"), None, Some("about:legacy-compat")));
        assert!(!is_conforming_doctype(Some("html"), None, Some("about:blank")));
        assert!(!is_conforming_doctype(Some("html"), Some(""), None));
        assert!(!is_conforming_doctype(Some("svg"), None, None));
    }

    #[test_case(Some("-//W3C//DTD HTML 4.0//EN"), None, true ; "html40 strict")]
    #[test_case(Some("-//W3C//DTD HTML 4.0//EN"), Some("http://www.w3.org/TR/REC-html40/strict.dtd"), true ; "html40 strict with system id")]
    #[test_case(Some("-//W3C//DTD HTML 4.01//EN"), None, true ; "html401 strict")]
    #[test_case(Some("-//W3C//DTD HTML 4.01//EN"), Some("http://www.w3.org/TR/html4/strict.dtd"), true ; "html401 strict with system id")]
    #[test_case(Some("-//W3C//DTD XHTML 1.0 Strict//EN"), Some("http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd"), true ; "xhtml10 strict")]
    #[test_case(Some("-//W3C//DTD XHTML 1.1//EN"), Some("http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd"), true ; "xhtml11")]
    #[test_case(Some("-//W3C//DTD XHTML 1.0 Strict//EN"), None, false ; "xhtml10 strict needs system id")]
    #[test_case(Some("-//W3C//DTD HTML 4.01//EN"), Some("http://www.w3.org/TR/html4/loose.dtd"), false ; "mismatched system id")]
    #[test_case(Some("-//W3C//DTD HTML 4.01 Transitional//EN"), Some("http://www.w3.org/TR/html4/loose.dtd"), false ; "transitional")]
    fn obsolete_permitted_doctypes(public_id: Option<&str>, system_id: Option<&str>, conforming: bool) {
        assert_eq!(is_conforming_doctype(Some("html"), public_id, system_id), conforming);
    }
}
