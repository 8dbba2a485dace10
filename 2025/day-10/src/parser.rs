use chumsky::prelude::*;
use miette::*;
use std::str::FromStr;

use crate::machine::{Button, CounterVector, LightPattern, Machine};

/// Decimal number that reports overflow as a parse error instead of panicking.
fn number<'a, T>() -> impl Parser<'a, &'a str, T, extra::Err<Rich<'a, char>>> + Clone
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    text::int(10).try_map(|digits: &str, span| {
        digits
            .parse::<T>()
            .map_err(|e| Rich::custom(span, format!("invalid number {digits}: {e}")))
    })
}

/// One machine line, e.g. `[.##.] (3) (1,3) (2) {3,5,4,7}`.
fn machine<'a>() -> impl Parser<'a, &'a str, Machine, extra::Err<Rich<'a, char>>> {
    // Custom whitespace parser that excludes newlines
    let hspace = one_of(" \t").repeated();

    let light = choice((just('.').to(false), just('#').to(true)));

    // [.##.]
    let diagram = light
        .repeated()
        .collect::<Vec<bool>>()
        .map(|v| v.into_iter().collect::<LightPattern>())
        .delimited_by(just('['), just(']'));

    // (0,2,3)
    let button = number::<usize>()
        .separated_by(just(','))
        .collect::<Vec<usize>>()
        .delimited_by(just('('), just(')'))
        .map(Button::new);

    // (0,2) (1,3) ...
    let buttons = button.padded_by(hspace).repeated().collect::<Vec<_>>();

    // {3,5,4,7}
    let counters = number::<u64>()
        .separated_by(just(','))
        .collect::<Vec<u64>>()
        .delimited_by(just('{'), just('}'))
        .map(CounterVector::from);

    hspace
        .ignore_then(diagram)
        .then_ignore(hspace)
        .then(buttons)
        .then(counters)
        .then_ignore(hspace)
        .try_map(|((lights, buttons), counters), span| {
            Machine::new(lights, buttons, counters).map_err(|e| Rich::custom(span, e))
        })
}

fn parser<'a>() -> impl Parser<'a, &'a str, Vec<Machine>, extra::Err<Rich<'a, char>>> {
    machine()
        .separated_by(text::newline())
        .allow_trailing()
        .collect()
}

/// Parses a whole puzzle input, one machine per line.
pub fn parse_machines(input: &str) -> Result<Vec<Machine>> {
    parser()
        .parse(input)
        .into_result()
        .map_err(|e| miette!("Parse failed: {:?}", e))
}

impl FromStr for Machine {
    type Err = Report;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        machine()
            .parse(line)
            .into_result()
            .map_err(|e| miette!("Parse failed: {:?}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[test]
    fn parses_the_example() -> Result<()> {
        let input = "[.##.] (3) (1,3) (2) (2,3) (0,2) (0,1) {3,5,4,7}
[...#.] (0,2,3,4) (2,3) (0,4) (0,1,2) (1,2,3,4) {7,5,12,7,2}
[.###.#] (0,1,2,3,4) (0,3,4) (0,1,2,4,5) (1,2) {10,11,11,5,10,5}
";
        let machines = parse_machines(input)?;
        assert_eq!(3, machines.len());

        let first = &machines[0];
        assert_eq!(4, first.light_count());
        assert_eq!(6, first.buttons().len());
        assert_eq!(&[1, 3], first.buttons()[1].indices());
        assert!(first.target_lights().is_on(1));
        assert!(!first.target_lights().is_on(3));
        assert_eq!(&[3, 5, 4, 7], first.target_counters().as_slice());

        assert_eq!(
            "[.###.#] (0,1,2,3,4) (0,3,4) (0,1,2,4,5) (1,2) {10,11,11,5,10,5}",
            machines[2].to_string()
        );
        Ok(())
    }

    #[test]
    fn accepts_crlf_and_tabs() -> Result<()> {
        let machines = parse_machines("[#.]\t(0) (1)\t{1,2}\r\n[..] (0,1) {0,0}\r\n")?;
        assert_eq!(2, machines.len());
        assert_eq!(2, machines[1].counter_count());
        Ok(())
    }

    #[test]
    fn machine_from_str() -> Result<()> {
        let machine: Machine = "[#] (0) {4}".parse()?;
        assert_eq!("[#] (0) {4}", machine.to_string());
        Ok(())
    }

    #[test]
    fn machine_without_buttons() -> Result<()> {
        let machine: Machine = "[.#] {0,1}".parse()?;
        assert!(machine.buttons().is_empty());
        Ok(())
    }

    #[rstest]
    #[case::index_out_of_range("[..] (0,2) {1,1}")]
    #[case::duplicate_index("[..] (1,1) {1,1}")]
    #[case::unknown_light("[.x] (0) {1,1}")]
    #[case::missing_counters("[..] (0) (1)")]
    #[case::counter_overflow("[.] (0) {99999999999999999999999}")]
    #[case::negative_counter("[.] (0) {-1}")]
    #[case::counter_beyond_i64("[.] (0) {9223372036854775808}")]
    #[case::counter_too_large("[..] (0) (1) {18446744073709551615,18446744073709551615}")]
    fn rejects_malformed_machines(#[case] line: &str) {
        assert!(line.parse::<Machine>().is_err());
        assert!(parse_machines(line).is_err());
    }
}
