use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stop {
    pub time: Option<String>,
    pub place: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayPlan {
    pub label: String,
    pub stops: Vec<Stop>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Itinerary {
    pub title: Option<String>,
    /// 첫 일차 전에 나오는 설명
    pub summary: Vec<String>,
    pub days: Vec<DayPlan>,
    /// 일정 뒤의 팁/참고 같은 부가 섹션
    pub notes: Vec<String>,
}

impl Itinerary {
    pub fn stop_count(&self) -> usize {
        self.days.iter().map(|d| d.stops.len()).sum()
    }
}

const IMPLICIT_DAY: &str = "1일차";

/// 장소가 하나도 없으면 None
pub fn parse_itinerary(text: &str) -> Option<Itinerary> {
    let mut itinerary = Itinerary::default();
    // 일차 섹션 안에 있는지 (일차가 아닌 제목이 나오면 닫힌다)
    let mut in_day = false;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || is_rule(line) {
            continue;
        }

        let (level, body) = split_heading(line);
        let bold_line = is_bold_line(body);
        let plain = clean(body);
        if plain.is_empty() {
            continue;
        }

        if let Some(item) = list_item(line) {
            if !in_day && !itinerary.days.is_empty() {
                itinerary.notes.push(clean(item));
                continue;
            }
            let Some(stop) = parse_stop(item) else {
                continue;
            };
            if itinerary.days.is_empty() {
                itinerary.days.push(DayPlan {
                    label: IMPLICIT_DAY.to_string(),
                    stops: Vec::new(),
                });
            }
            in_day = true;
            if let Some(day) = itinerary.days.last_mut() {
                day.stops.push(stop);
            }
            continue;
        }

        if is_day_label(&plain) && (level > 0 || bold_line || plain.len() <= 40) {
            itinerary.days.push(DayPlan {
                label: plain,
                stops: Vec::new(),
            });
            in_day = true;
            continue;
        }

        if level > 0 {
            if itinerary.title.is_none() && itinerary.days.is_empty() {
                itinerary.title = Some(plain);
            } else {
                in_day = false;
            }
            continue;
        }

        if itinerary.days.is_empty() {
            itinerary.summary.push(plain);
        } else if !in_day {
            itinerary.notes.push(plain);
        } else if let Some(stop) = itinerary.days.last_mut().and_then(|d| d.stops.last_mut()) {
            // 장소 아래 들여쓴 설명은 그 장소의 메모로 붙인다
            stop.note = Some(match stop.note.take() {
                Some(note) => format!("{} {}", note, plain),
                None => plain,
            });
        }
    }

    itinerary.days.retain(|d| !d.stops.is_empty());
    if itinerary.days.is_empty() {
        None
    } else {
        Some(itinerary)
    }
}

fn is_rule(line: &str) -> bool {
    line.len() >= 3 && line.chars().all(|c| c == '-' || c == '=' || c == '*')
}

fn split_heading(line: &str) -> (usize, &str) {
    let level = line.chars().take_while(|c| *c == '#').count();
    (level, line[level..].trim())
}

fn is_bold_line(body: &str) -> bool {
    body.len() > 4 && body.starts_with("**") && body.trim_end_matches(':').ends_with("**")
}

fn clean(s: &str) -> String {
    s.replace("**", "")
        .replace("__", "")
        .trim()
        .trim_end_matches(':')
        .trim()
        .to_string()
}

static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•·]|\d+[.)])\s+(.*)$").expect("list item pattern"));

// "Day 2", "2일차", "둘째 날: ..." 형태
static DAY_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^day\s*\d|\d\s*일차|^[^:(\-]*째 ?날\s*(?:[:(\-]|$)").expect("day label pattern")
});

// "9:00", "11:30~13:00" 처럼 시:분 (범위 포함) 으로 시작
static TIME_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\[(]*(\d{1,2}:\d{2})(?:\s*[~\-–]\s*(\d{1,2}:\d{2}))?").expect("time pattern")
});

fn list_item(line: &str) -> Option<&str> {
    LIST_ITEM
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

fn is_day_label(s: &str) -> bool {
    DAY_LABEL.is_match(s)
}

fn take_time(s: &str) -> (Option<String>, &str) {
    let Some(caps) = TIME_PREFIX.captures(s) else {
        return (None, s.trim_start_matches(['[', '(']));
    };
    let rest = &s[caps[0].len()..];
    let time = match caps.get(2) {
        Some(end) => format!("{}~{}", &caps[1], end.as_str()),
        None => caps[1].to_string(),
    };
    (Some(time), rest)
}

fn parse_stop(item: &str) -> Option<Stop> {
    let text = clean(item);
    let (time, rest) = take_time(&text);
    let rest = rest
        .trim_start_matches([']', ')'])
        .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '–' | ':' | '|'))
        .trim();

    let (place, note) = [" - ", " – ", ": ", " | "]
        .iter()
        .filter_map(|sep| rest.split_once(sep))
        .min_by_key(|(place, _)| place.len())
        .map(|(place, note)| (place.trim(), Some(note.trim().to_string())))
        .unwrap_or((rest, None));

    if place.is_empty() {
        return None;
    }
    Some(Stop {
        time,
        place: place.to_string(),
        note: note.filter(|n| !n.is_empty()),
    })
}
