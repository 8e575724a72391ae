//! Town popup extraction.
//!
//! Popups are HTML fragments produced by the Towny map plugin. After the
//! markup is minified, it is read with a small grammar:
//!
//! ```text
//! <div class="infowindow"><span ...>NAME[ (NATION)]</span><br><i>BOARD</i>
//!   ... Mayor: <b>..</b> ... Councillors: <b>..</b> ... Founded: <b>..</b>
//!   ... PVP: <b>..</b> ... Public: <b>..</b> ... </summary>RESIDENTS</details> ... </div>
//! ```
//!
//! Name and nation may each be wrapped in a link. Anything that does not fit
//! is reported as [`PopupMatch::NotATown`].

use chrono::NaiveDate;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_until};
use nom::combinator::{eof, map, opt, rest, success, verify};
use nom::error::{Error, ErrorKind};
use nom::sequence::{delimited, preceded, terminated};
use nom::{IResult, Parser};

use crate::types::TownRecord;

const INFOWINDOW: &str = r#"<div class="infowindow">"#;

/// Result of reading one popup.
#[derive(Debug, Clone, PartialEq)]
pub enum PopupMatch {
    Town(TownRecord),
    NotATown,
}

impl PopupMatch {
    pub fn into_town(self) -> Option<TownRecord> {
        match self {
            PopupMatch::Town(record) => Some(record),
            PopupMatch::NotATown => None,
        }
    }
}

/// Borrowed fields, straight out of the grammar.
#[derive(Debug, PartialEq)]
struct PopupFields<'a> {
    name: &'a str,
    nation: Option<&'a str>,
    board: &'a str,
    mayor: &'a str,
    councillors: &'a str,
    founded: &'a str,
    pvp: &'a str,
    public: &'a str,
    residents: &'a str,
}

pub fn extract(markup: &str) -> PopupMatch {
    let minified = minify(markup);
    match town_popup(&minified) {
        Ok((_, fields)) => PopupMatch::Town(fields.into_record()),
        Err(_) => PopupMatch::NotATown,
    }
}

/// Drops whitespace between tags and every newline, then trims.
pub fn minify(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut gap = String::new();
    let mut after_tag = false;

    for ch in markup.chars() {
        if after_tag {
            if ch.is_whitespace() {
                gap.push(ch);
                continue;
            }
            after_tag = false;
            if ch != '<' {
                out.extend(gap.chars().filter(|&c| c != '\n'));
            }
            gap.clear();
        }
        if ch == '>' {
            out.push(ch);
            after_tag = true;
        } else if ch != '\n' {
            out.push(ch);
        }
    }
    out.extend(gap.chars().filter(|&c| c != '\n'));

    out.trim().to_string()
}

/// Parses a founding date such as `Mar 29 2023` into Unix milliseconds.
pub fn parse_founded(text: &str) -> Option<i64> {
    const FORMATS: [&str; 6] = ["%b %d %Y", "%B %d %Y", "%b %d, %Y", "%B %d, %Y", "%Y-%m-%d", "%m/%d/%Y"];

    let text = text.trim();
    FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp_millis())
}

fn town_popup(input: &str) -> IResult<&str, PopupFields<'_>> {
    let (input, _) = (take_until(INFOWINDOW), tag(INFOWINDOW)).parse(input)?;
    let (input, _) = (tag("<span "), take_until(">"), tag(">")).parse(input)?;
    let (input, heading_text) = terminated(take_until("</span>"), tag("</span>")).parse(input)?;
    let (_, (name, nation)) = heading(heading_text)?;

    let (input, board) = delimited(tag("<br><i>"), take_until("</i>"), tag("</i>")).parse(input)?;
    let (input, mayor) = labelled(input, "Mayor: <b>")?;
    let (input, councillors) = labelled(input, "Councillors: <b>")?;
    let (input, founded) = labelled(input, "Founded: <b>")?;
    let (input, pvp) = labelled(input, "PVP: <b>")?;
    let (input, public) = labelled(input, "Public: <b>")?;

    let (input, _) = (take_until("</summary>"), tag("</summary>")).parse(input)?;
    let (input, residents) = terminated(
        verify(take_until("</details>"), |s: &str| !s.is_empty()),
        tag("</details>"),
    )
    .parse(input)?;
    let (input, _) = (take_until("</div>"), tag("</div>")).parse(input)?;

    Ok((
        input,
        PopupFields {
            name,
            nation,
            board,
            mayor,
            councillors,
            founded,
            pvp,
            public,
            residents,
        },
    ))
}

/// `NAME` or `NAME (NATION)`, each optionally inside `<a href=...>..</a>`.
fn heading(input: &str) -> IResult<&str, (&str, Option<&str>)> {
    // the link target may itself contain parentheses
    let nation_suffix = delimited(
        (tag(" ("), opt(link_opener)),
        alt((take_until("</a>"), take_until(")"))),
        (opt(tag("</a>")), tag(")"), eof),
    );

    let (input, (name, nation)) = alt((
        (take_until(" ("), map(nation_suffix, Some)),
        (rest, success(None)),
    ))
    .parse(input)?;

    let name = unlink(name);
    if name.is_empty() {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Verify)));
    }
    let nation = nation.map(unlink).filter(|n| !n.is_empty());

    Ok((input, (name, nation)))
}

/// Skips to `label` and returns the non-empty text up to the next `</b>`.
fn labelled<'a>(input: &'a str, label: &'static str) -> IResult<&'a str, &'a str> {
    preceded(
        (take_until(label), tag(label)),
        terminated(verify(take_until("</b>"), |s: &str| !s.is_empty()), tag("</b>")),
    )
    .parse(input)
}

fn link_opener(input: &str) -> IResult<&str, (&str, &str, &str)> {
    (tag("<a href="), take_until(">"), tag(">")).parse(input)
}

fn unlink(fragment: &str) -> &str {
    let text = link_opener(fragment).map_or(fragment, |(inner, _)| inner);
    text.strip_suffix("</a>").unwrap_or(text)
}

impl PopupFields<'_> {
    fn into_record(self) -> TownRecord {
        let residents = self
            .residents
            .trim()
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(String::from)
            .collect();

        TownRecord {
            name: self.name.to_string(),
            nation_name: self.nation.map(String::from),
            board: self.board.to_string(),
            mayor: self.mayor.to_string(),
            councillors: self.councillors.to_string(),
            founded_text: self.founded.to_string(),
            pvp: self.pvp.trim().eq_ignore_ascii_case("true"),
            public: self.public.trim().eq_ignore_ascii_case("true"),
            residents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOWN_POPUP: &str = r#"
        <div class="infowindow">
            <span style="font-size:120%;"><a href="https://wiki.example/Kassel" target="_blank">Kassel</a> (<a href="https://wiki.example/Hesse" target="_blank">Hesse</a>)</span><br>
            <i>Welcome to Kassel!</i>
            <br>
            <span style="font-weight:bold">Mayor: <b>Fritz_01</b></span><br>
            <span style="font-weight:bold">Councillors: <b>Anna, Bert</b></span><br>
            <span style="font-weight:bold">Founded: <b>Mar 29 2023</b></span><br>
            <span style="font-weight:bold">PVP: <b>false</b></span><br>
            <span style="font-weight:bold">Public: <b>true</b></span><br>
            <details>
                <summary>Residents</summary>
                Fritz_01, Anna, Bert, ,Carla
            </details>
        </div>"#;

    fn town(markup: &str) -> TownRecord {
        extract(markup).into_town().expect("fixture should be a town")
    }

    #[test]
    fn extracts_every_field() {
        let record = town(TOWN_POPUP);
        assert_eq!(record.name, "Kassel");
        assert_eq!(record.nation_name.as_deref(), Some("Hesse"));
        assert_eq!(record.board, "Welcome to Kassel!");
        assert_eq!(record.mayor, "Fritz_01");
        assert_eq!(record.councillors, "Anna, Bert");
        assert_eq!(record.founded_text, "Mar 29 2023");
        assert!(!record.pvp);
        assert!(record.public);
        assert_eq!(record.residents, vec!["Fritz_01", "Anna", "Bert", "Carla"]);
        assert_eq!(record.population(), 4);
    }

    #[test]
    fn plain_name_without_nation_and_empty_board() {
        let markup = r#"<div class="infowindow"><span style="x">Lonely</span><br><i></i><br>
            Mayor: <b>solo</b> Councillors: <b>None</b> Founded: <b>Jan 2 2021</b>
            PVP: <b>true</b> Public: <b>false</b><details><summary>Residents</summary>solo</details></div>"#;
        let record = town(markup);
        assert_eq!(record.name, "Lonely");
        assert_eq!(record.nation_name, None);
        assert_eq!(record.board, "");
        assert!(record.pvp);
        assert_eq!(record.residents, vec!["solo"]);
    }

    #[test]
    fn unlinked_nation() {
        let markup = r#"<div class="infowindow"><span style="x">Rome (Italia)</span><br><i>SPQR</i>
            Mayor: <b>a</b> Councillors: <b>b</b> Founded: <b>c</b> PVP: <b>d</b> Public: <b>e</b>
            <details><summary>R</summary>a,b</details></div>"#;
        let record = town(markup);
        assert_eq!(record.name, "Rome");
        assert_eq!(record.nation_name.as_deref(), Some("Italia"));
        assert_eq!(record.founded_text, "c");
    }

    #[test]
    fn parenthesised_nation_link() {
        let markup = TOWN_POPUP.replace("wiki.example/Hesse", "wiki.example/Hesse_(nation)");
        let record = town(&markup);
        assert_eq!(record.name, "Kassel");
        assert_eq!(record.nation_name.as_deref(), Some("Hesse"));

        let markup = TOWN_POPUP.replace("wiki.example/Kassel", "wiki.example/Kassel_(town)");
        assert_eq!(town(&markup).nation_name.as_deref(), Some("Hesse"));
    }

    #[test]
    fn other_markup_is_not_a_town() {
        assert_eq!(extract(""), PopupMatch::NotATown);
        assert_eq!(
            extract(r#"<div class="infowindow"><span>Shop</span><br><i>Sells bread</i></div>"#),
            PopupMatch::NotATown
        );
        // missing residents block
        let truncated = TOWN_POPUP.replace("</details>", "");
        assert_eq!(extract(&truncated), PopupMatch::NotATown);
        // empty mayor
        let no_mayor = TOWN_POPUP.replace("<b>Fritz_01</b>", "<b></b>");
        assert_eq!(extract(&no_mayor), PopupMatch::NotATown);
    }

    #[test]
    fn minify_drops_inter_tag_whitespace() {
        assert_eq!(minify("  <a>\n   <b> x\ny </b>  "), "<a><b> xy </b>");
    }

    #[test]
    fn founded_dates() {
        assert_eq!(parse_founded("Jan 1 1970"), Some(0));
        assert_eq!(parse_founded("Jan 2 1970"), Some(86_400_000));
        assert_eq!(parse_founded("2023-03-29"), parse_founded("Mar 29 2023"));
        assert!(parse_founded("Mar 29 2023").is_some());
        assert_eq!(parse_founded("a long time ago"), None);
    }
}
