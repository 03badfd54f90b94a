use serde::Serialize;

/// Platoons ("delinger") carried by the unit.
pub const DEL_COUNT: u32 = 4;
pub const SERGEANTS_PER_DEL: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sergeant {
    pub id: String,
    pub name: String,
}

fn del_letter(del: u32) -> Option<char> {
    match del {
        1 => Some('a'),
        2 => Some('b'),
        3 => Some('c'),
        4 => Some('d'),
        _ => None,
    }
}

/// The five sergeants of one DEL. Unknown DEL numbers yield an empty
/// roster rather than an error.
pub fn del_sergeants(del: u32) -> Vec<Sergeant> {
    let Some(letter) = del_letter(del) else {
        return Vec::new();
    };
    (1..=SERGEANTS_PER_DEL)
        .map(|n| Sergeant {
            id: format!("sgt-{}{}", letter, n),
            name: format!("SGT {}{}", letter.to_ascii_uppercase(), n),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelRoster {
    pub del: u32,
    pub sergeants: Vec<Sergeant>,
}

pub fn full_roster() -> Vec<DelRoster> {
    (1..=DEL_COUNT)
        .map(|del| DelRoster {
            del,
            sergeants: del_sergeants(del),
        })
        .collect()
}
