//! Parser godeł map topograficznych i nawigacja po hierarchii arkuszy
//!
//! Godło jest rozdzielanym myślnikami kodem arkusza w jednej z siedmiu
//! zagnieżdżonych skal, od 1:1 000 000 (np. "N-34") do 1:10 000
//! (np. "N-34-130-D-d-2-4"). Skala nigdy nie jest podawana przez
//! wywołującego: wynika wyłącznie ze struktury kodu.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use regex::Regex;
use tracing::trace;

use crate::error::GodloError;
use crate::types::{Arkusz200k, Components, Scale, Uklad};

/// Wzorce godła dla każdej skali, od najgrubszej do najdrobniejszej.
/// Kotwice `^...$` gwarantują, że kod pasuje do co najwyżej jednego wzorca.
const PATTERNS: [(Scale, &str); 7] = [
    (Scale::S1M, r"^([A-Z])-(\d{1,2})$"),
    (Scale::S500k, r"^([A-Z])-(\d{1,2})-([A-D])$"),
    (Scale::S200k, r"^([A-Z])-(\d{1,2})-(\d{1,3})$"),
    (Scale::S100k, r"^([A-Z])-(\d{1,2})-(\d{1,3})-([A-D])$"),
    (Scale::S50k, r"^([A-Z])-(\d{1,2})-(\d{1,3})-([A-D])-([a-d])$"),
    (
        Scale::S25k,
        r"^([A-Z])-(\d{1,2})-(\d{1,3})-([A-D])-([a-d])-([1-4])$",
    ),
    (
        Scale::S10k,
        r"^([A-Z])-(\d{1,2})-(\d{1,3})-([A-D])-([a-d])-([1-4])-([1-4])$",
    ),
];

fn patterns() -> &'static [(Scale, Regex)] {
    static COMPILED: OnceLock<Vec<(Scale, Regex)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        PATTERNS
            .iter()
            .map(|&(scale, pattern)| (scale, Regex::new(pattern).expect("wzorzec godła")))
            .collect()
    })
}

/// Suffiksy dzieci dla skal dzielonych na 4 części.
/// 1:500k dzieli się na 36 arkuszy numerowanych i ma osobną logikę.
fn child_suffixes(scale: Scale) -> &'static [&'static str] {
    match scale {
        Scale::S1M | Scale::S200k => &["A", "B", "C", "D"],
        Scale::S100k => &["a", "b", "c", "d"],
        Scale::S50k | Scale::S25k => &["1", "2", "3", "4"],
        Scale::S500k | Scale::S10k => &[],
    }
}

/// Litera działu 1:500k dla numeru arkusza 1:200k.
///
/// Numeracja 1-144 dzieli się na cztery bloki po 36:
/// A: 1-36, B: 37-72, C: 73-108, D: 109-144.
pub fn section_letter(numer: u16) -> char {
    match numer.saturating_sub(1) / 36 {
        0 => 'A',
        1 => 'B',
        2 => 'C',
        _ => 'D',
    }
}

/// Zakres numerów arkuszy 1:200k wewnątrz działu 1:500k o danej literze.
pub fn numer_block(litera: char) -> std::ops::RangeInclusive<u16> {
    let idx = (litera as u16).saturating_sub('A' as u16);
    (idx * 36 + 1)..=((idx + 1) * 36)
}

/// Godło arkusza mapy: wartość niemutowalna po sparsowaniu
///
/// Dwa godła są równe wtedy i tylko wtedy, gdy mają ten sam znormalizowany
/// kod i ten sam układ.
#[derive(Debug, Clone)]
pub struct Godlo {
    godlo: String,
    scale: Scale,
    uklad: Uklad,
    components: Components,
}

impl Godlo {
    /// Parsuje godło w domyślnym układzie 1992.
    ///
    /// # Errors
    ///
    /// `GodloError::Empty` dla pustego wejścia, `GodloError::InvalidGodlo`
    /// gdy kod nie pasuje do żadnego wzorca skali.
    pub fn parse(code: &str) -> Result<Self, GodloError> {
        Self::parse_with_uklad(code, Uklad::default())
    }

    /// Parsuje godło w podanym układzie współrzędnych.
    pub fn parse_with_uklad(code: &str, uklad: Uklad) -> Result<Self, GodloError> {
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return Err(GodloError::Empty);
        }

        let normalized = normalize(trimmed);

        let (scale, captures) = patterns()
            .iter()
            .find_map(|(scale, regex)| regex.captures(&normalized).map(|c| (*scale, c)))
            .ok_or_else(|| GodloError::InvalidGodlo(trimmed.to_string()))?;

        let components = extract_components(&normalized, &captures)?;
        trace!(godlo = %normalized, scale = %scale, "parsed godlo");

        Ok(Self {
            godlo: normalized,
            scale,
            uklad,
            components,
        })
    }

    /// Znormalizowane godło arkusza
    pub fn godlo(&self) -> &str {
        &self.godlo
    }

    /// Skala mapy
    pub fn scale(&self) -> Scale {
        self.scale
    }

    /// Układ współrzędnych
    pub fn uklad(&self) -> Uklad {
        self.uklad
    }

    /// Składowe godła
    pub fn components(&self) -> &Components {
        &self.components
    }

    /// Arkusz nadrzędny (o skali grubszej), `None` na poziomie 1:1M.
    ///
    /// Dla wszystkich skal poza 1:200k rodzic powstaje przez odcięcie
    /// ostatniej składowej kodu. Krok 1:200k → 1:500k nie da się wyrazić
    /// odcięciem (podział 36-krotny), więc liczymy dział z numeru arkusza.
    pub fn parent(&self) -> Result<Option<Godlo>, GodloError> {
        if self.scale == Scale::S1M {
            return Ok(None);
        }

        if self.scale == Scale::S200k {
            if let Some(Arkusz200k::Numer(numer)) = self.components.arkusz_200k {
                let code = format!(
                    "{}-{}-{}",
                    self.components.pas,
                    self.components.slup,
                    section_letter(numer)
                );
                return Godlo::parse_with_uklad(&code, self.uklad).map(Some);
            }
        }

        let parts: Vec<&str> = self.godlo.split('-').collect();
        if parts.len() <= 2 {
            return Ok(None);
        }
        let parent_code = parts[..parts.len() - 1].join("-");
        Godlo::parse_with_uklad(&parent_code, self.uklad).map(Some)
    }

    /// Arkusze podrzędne (o skali drobniejszej), pusta lista na 1:10k.
    ///
    /// 1:500k ma 36 dzieci numerowanych blokami (A→1-36 ... D→109-144),
    /// pozostałe skale mają po 4 dzieci z suffiksami.
    pub fn children(&self) -> Result<Vec<Godlo>, GodloError> {
        if self.scale == Scale::S10k {
            return Ok(Vec::new());
        }

        if self.scale == Scale::S500k {
            if let Some(Arkusz200k::Litera(litera)) = self.components.arkusz_200k {
                return numer_block(litera)
                    .map(|numer| {
                        let code = format!(
                            "{}-{}-{}",
                            self.components.pas, self.components.slup, numer
                        );
                        Godlo::parse_with_uklad(&code, self.uklad)
                    })
                    .collect();
            }
        }

        child_suffixes(self.scale)
            .iter()
            .map(|suffix| Godlo::parse_with_uklad(&format!("{}-{}", self.godlo, suffix), self.uklad))
            .collect()
    }

    /// Pełna hierarchia w górę, od bieżącego arkusza do 1:1M (włącznie).
    ///
    /// Pierwszy element to bieżący arkusz, ostatni jest zawsze w skali 1:1M.
    pub fn hierarchy_up(&self) -> Result<Vec<Godlo>, GodloError> {
        let mut chain = vec![self.clone()];
        let mut current = self.clone();
        while let Some(parent) = current.parent()? {
            chain.push(parent.clone());
            current = parent;
        }
        Ok(chain)
    }

    /// Wszystkie arkusze potomne w zadanej skali docelowej.
    ///
    /// Liczba wyników rośnie wykładniczo: każdy krok wnosi czynnik 4,
    /// a krok 1:500k → 1:200k czynnik 36.
    ///
    /// # Errors
    ///
    /// `GodloError::ScaleNotFiner` gdy skala docelowa nie jest ściśle
    /// drobniejsza od bieżącej.
    pub fn descendants(&self, target: Scale) -> Result<Vec<Godlo>, GodloError> {
        if !target.is_finer_than(self.scale) {
            return Err(GodloError::ScaleNotFiner {
                current: self.scale,
                target,
            });
        }

        let mut out = Vec::new();
        self.collect_descendants(target, &mut out)?;
        Ok(out)
    }

    fn collect_descendants(&self, target: Scale, out: &mut Vec<Godlo>) -> Result<(), GodloError> {
        if self.scale == target {
            out.push(self.clone());
            return Ok(());
        }
        for child in self.children()? {
            child.collect_descendants(target, out)?;
        }
        Ok(())
    }
}

impl fmt::Display for Godlo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (skala {}, uklad {})",
            self.godlo, self.scale, self.uklad
        )
    }
}

impl PartialEq for Godlo {
    fn eq(&self, other: &Self) -> bool {
        self.godlo == other.godlo && self.uklad == other.uklad
    }
}

impl Eq for Godlo {}

impl Hash for Godlo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.godlo.hash(state);
        self.uklad.hash(state);
    }
}

/// Normalizuje wielkość liter pozycyjnie, przed wykryciem skali.
///
/// Część 0 (pas) i część 3 (arkusz 100k) są zapisywane wielką literą,
/// część 4 małą, o ile jest pojedynczą literą a-d. Pozostałe części
/// przechodzą bez zmian.
fn normalize(code: &str) -> String {
    let parts: Vec<&str> = code.split('-').collect();
    if parts.len() < 2 {
        // Walidacja wzorcem i tak odrzuci taki kod
        return code.to_string();
    }

    let normalized: Vec<String> = parts
        .iter()
        .enumerate()
        .map(|(i, part)| match i {
            0 | 3 => part.to_ascii_uppercase(),
            4 if is_single_quadrant_letter(part) => part.to_ascii_lowercase(),
            _ => (*part).to_string(),
        })
        .collect();

    normalized.join("-")
}

fn is_single_quadrant_letter(part: &str) -> bool {
    let mut chars = part.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some('a'..='d' | 'A'..='D'), None)
    )
}

/// Przypisuje grupy dopasowania do składowych godła.
///
/// Trzecia składowa jest rozstrzygana po kształcie wartości: same cyfry
/// to numer arkusza 1:200k, pojedyncza litera to dział 1:500k.
fn extract_components(
    godlo: &str,
    captures: &regex::Captures<'_>,
) -> Result<Components, GodloError> {
    let group = |i: usize| captures.get(i).map(|m| m.as_str());

    let pas = group(1)
        .and_then(|s| s.chars().next())
        .ok_or_else(|| GodloError::InvalidGodlo(godlo.to_string()))?;

    let slup = group(2)
        .and_then(|s| s.parse::<u8>().ok())
        .ok_or_else(|| GodloError::invalid_component(godlo, "slup is not a number"))?;

    let arkusz_200k = match group(3) {
        None => None,
        Some(text) if text.chars().all(|c| c.is_ascii_digit()) => {
            let numer: u16 = text
                .parse()
                .map_err(|_| GodloError::invalid_component(godlo, "arkusz 200k is not a number"))?;
            if !(1..=144).contains(&numer) {
                return Err(GodloError::invalid_component(
                    godlo,
                    format!("arkusz 200k out of range 1-144: {numer}"),
                ));
            }
            Some(Arkusz200k::Numer(numer))
        }
        Some(text) => text.chars().next().map(Arkusz200k::Litera),
    };

    let arkusz_100k = group(4).and_then(|s| s.chars().next());
    let arkusz_50k = group(5).and_then(|s| s.chars().next());
    let arkusz_25k = group(6).and_then(|s| s.parse::<u8>().ok());
    let arkusz_10k = group(7).and_then(|s| s.parse::<u8>().ok());

    Ok(Components {
        pas,
        slup,
        arkusz_200k,
        arkusz_100k,
        arkusz_50k,
        arkusz_25k,
        arkusz_10k,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_each_scale() {
        let cases = [
            ("N-34", Scale::S1M),
            ("N-34-A", Scale::S500k),
            ("N-34-130", Scale::S200k),
            ("N-34-130-D", Scale::S100k),
            ("N-34-130-D-d", Scale::S50k),
            ("N-34-130-D-d-2", Scale::S25k),
            ("N-34-130-D-d-2-4", Scale::S10k),
        ];
        for (code, scale) in cases {
            let godlo = Godlo::parse(code).unwrap();
            assert_eq!(godlo.scale(), scale, "{code}");
            assert_eq!(godlo.godlo(), code);
        }
    }

    #[test]
    fn test_parse_components_10k() {
        let godlo = Godlo::parse("N-34-130-D-d-2-4").unwrap();
        let c = godlo.components();
        assert_eq!(c.pas, 'N');
        assert_eq!(c.slup, 34);
        assert_eq!(c.arkusz_200k, Some(Arkusz200k::Numer(130)));
        assert_eq!(c.arkusz_100k, Some('D'));
        assert_eq!(c.arkusz_50k, Some('d'));
        assert_eq!(c.arkusz_25k, Some(2));
        assert_eq!(c.arkusz_10k, Some(4));
    }

    #[test]
    fn test_parse_500k_is_letter() {
        let godlo = Godlo::parse("N-34-A").unwrap();
        assert_eq!(
            godlo.components().arkusz_200k,
            Some(Arkusz200k::Litera('A'))
        );
    }

    #[test]
    fn test_normalize_mixed_case() {
        let godlo = Godlo::parse("n-34-130-d-D-2-4").unwrap();
        assert_eq!(godlo.godlo(), "N-34-130-D-d-2-4");
        assert_eq!(godlo.scale(), Scale::S10k);
    }

    #[test]
    fn test_normalize_upper_50k() {
        let godlo = Godlo::parse("N-34-130-D-D").unwrap();
        assert_eq!(godlo.godlo(), "N-34-130-D-d");
    }

    #[test]
    fn test_normalize_is_positional() {
        // Część 3 idzie do wielkich liter tylko wtedy, gdy istnieje
        let godlo = Godlo::parse("n-34").unwrap();
        assert_eq!(godlo.godlo(), "N-34");
    }

    #[test]
    fn test_strip_whitespace() {
        let godlo = Godlo::parse("  N-34-130-D  ").unwrap();
        assert_eq!(godlo.godlo(), "N-34-130-D");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Godlo::parse(""), Err(GodloError::Empty)));
        assert!(matches!(Godlo::parse("   "), Err(GodloError::Empty)));
        assert!(matches!(
            Godlo::parse("INVALID-GODLO"),
            Err(GodloError::InvalidGodlo(_))
        ));
        assert!(Godlo::parse("1-34").is_err());
        assert!(Godlo::parse("N-34-130-E").is_err());
        assert!(Godlo::parse("N-34-130-D-e").is_err());
        assert!(Godlo::parse("N-34-130-D-d-5").is_err());
        assert!(Godlo::parse("N-34-130-D-d-2-0").is_err());
    }

    #[test]
    fn test_numer_out_of_range() {
        assert!(matches!(
            Godlo::parse("N-34-0"),
            Err(GodloError::InvalidComponent { .. })
        ));
        assert!(matches!(
            Godlo::parse("N-34-145"),
            Err(GodloError::InvalidComponent { .. })
        ));
        assert!(Godlo::parse("N-34-144").is_ok());
        assert!(Godlo::parse("N-34-1").is_ok());
    }

    #[test]
    fn test_slup_edge_values() {
        assert_eq!(Godlo::parse("M-1").unwrap().components().slup, 1);
        assert_eq!(Godlo::parse("M-99").unwrap().components().slup, 99);
    }

    #[test]
    fn test_equality_and_hash() {
        use std::collections::HashSet;

        let a = Godlo::parse("N-34-130-D").unwrap();
        let b = Godlo::parse("n-34-130-d").unwrap();
        let c = Godlo::parse_with_uklad("N-34-130-D", Uklad::U2000).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        set.insert(c);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_section_letter() {
        assert_eq!(section_letter(1), 'A');
        assert_eq!(section_letter(36), 'A');
        assert_eq!(section_letter(37), 'B');
        assert_eq!(section_letter(72), 'B');
        assert_eq!(section_letter(73), 'C');
        assert_eq!(section_letter(108), 'C');
        assert_eq!(section_letter(109), 'D');
        assert_eq!(section_letter(144), 'D');
        assert_eq!(section_letter(130), 'D');
    }

    #[test]
    fn test_numer_block() {
        assert_eq!(numer_block('A'), 1..=36);
        assert_eq!(numer_block('B'), 37..=72);
        assert_eq!(numer_block('C'), 73..=108);
        assert_eq!(numer_block('D'), 109..=144);
    }

    #[test]
    fn test_section_roundtrip() {
        for litera in ['A', 'B', 'C', 'D'] {
            for numer in numer_block(litera) {
                assert_eq!(section_letter(numer), litera);
            }
        }
    }

    #[test]
    fn test_parent_by_truncation() {
        let godlo = Godlo::parse("N-34-130-D-d-2-4").unwrap();
        let parent = godlo.parent().unwrap().unwrap();
        assert_eq!(parent.godlo(), "N-34-130-D-d-2");
        assert_eq!(parent.scale(), Scale::S25k);
    }

    #[test]
    fn test_parent_from_200k() {
        let parent = Godlo::parse("N-34-130").unwrap().parent().unwrap().unwrap();
        assert_eq!(parent.godlo(), "N-34-D");
        assert_eq!(parent.scale(), Scale::S500k);

        let parent = Godlo::parse("N-34-36").unwrap().parent().unwrap().unwrap();
        assert_eq!(parent.godlo(), "N-34-A");
    }

    #[test]
    fn test_parent_at_top() {
        assert!(Godlo::parse("N-34").unwrap().parent().unwrap().is_none());
    }

    #[test]
    fn test_parent_keeps_uklad() {
        let godlo = Godlo::parse_with_uklad("N-34-130-D", Uklad::U2000).unwrap();
        let parent = godlo.parent().unwrap().unwrap();
        assert_eq!(parent.uklad(), Uklad::U2000);
    }

    #[test]
    fn test_children_of_1m() {
        let children = Godlo::parse("N-34").unwrap().children().unwrap();
        let codes: Vec<&str> = children.iter().map(|g| g.godlo()).collect();
        assert_eq!(codes, ["N-34-A", "N-34-B", "N-34-C", "N-34-D"]);
        assert!(children.iter().all(|g| g.scale() == Scale::S500k));
    }

    #[test]
    fn test_children_of_500k() {
        let children = Godlo::parse("N-34-A").unwrap().children().unwrap();
        assert_eq!(children.len(), 36);
        assert_eq!(children[0].godlo(), "N-34-1");
        assert_eq!(children[35].godlo(), "N-34-36");
        assert!(children.iter().all(|g| g.scale() == Scale::S200k));

        let children = Godlo::parse("N-34-D").unwrap().children().unwrap();
        assert_eq!(children[0].godlo(), "N-34-109");
        assert_eq!(children[35].godlo(), "N-34-144");
    }

    #[test]
    fn test_children_of_10k_empty() {
        let children = Godlo::parse("N-34-130-D-d-2-4").unwrap().children().unwrap();
        assert!(children.is_empty());
    }

    #[test]
    fn test_descendants_errors() {
        let godlo = Godlo::parse("N-34-130-D").unwrap();
        // Ta sama skala i skala grubsza są odrzucane
        assert!(matches!(
            godlo.descendants(Scale::S100k),
            Err(GodloError::ScaleNotFiner { .. })
        ));
        assert!(matches!(
            godlo.descendants(Scale::S1M),
            Err(GodloError::ScaleNotFiner { .. })
        ));
    }

    #[test]
    fn test_descendants_25k_to_10k() {
        let godlo = Godlo::parse("N-34-130-D-d-2").unwrap();
        let descendants = godlo.descendants(Scale::S10k).unwrap();
        let codes: Vec<&str> = descendants.iter().map(|g| g.godlo()).collect();
        assert_eq!(
            codes,
            [
                "N-34-130-D-d-2-1",
                "N-34-130-D-d-2-2",
                "N-34-130-D-d-2-3",
                "N-34-130-D-d-2-4",
            ]
        );
    }

    #[test]
    fn test_hierarchy_up_from_10k() {
        let godlo = Godlo::parse("N-34-130-D-d-2-4").unwrap();
        let chain = godlo.hierarchy_up().unwrap();
        assert_eq!(chain.len(), 7);
        assert_eq!(chain[0].godlo(), "N-34-130-D-d-2-4");
        assert_eq!(chain[6].godlo(), "N-34");
        assert_eq!(chain[6].scale(), Scale::S1M);
    }
}
