use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, multispace0},
    combinator::{all_consuming, map, opt, value},
    number::complete::double,
    sequence::{delimited, preceded, separated_pair, terminated},
    IResult, Parser,
};

use crate::error::GasError;
use crate::models::GasMix;

/// Parse a gas label such as `Air`, `EAN32`, `Nx 36`, `32%`, `Tx 18/45`,
/// `Trimix 21/35` or `O2` into a validated mix.
pub fn parse_gas_mix(label: &str) -> Result<GasMix, GasError> {
    let input = label.trim();
    if input.is_empty() {
        return Err(invalid(label, "empty label".to_string()));
    }

    let (o2, he) = match all_consuming(gas_label).parse(input) {
        Ok((_, fractions)) => fractions,
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
            return Err(invalid(
                label,
                format!(
                    "unrecognised label at position {}",
                    input.len() - e.input.len()
                ),
            ));
        }
        Err(nom::Err::Incomplete(_)) => {
            return Err(invalid(label, "incomplete label".to_string()));
        }
    };

    GasMix::new(o2, he).map_err(|e| invalid(label, e.to_string()))
}

fn invalid(label: &str, message: String) -> GasError {
    GasError::InvalidMix {
        label: label.to_string(),
        message,
    }
}

fn gas_label(input: &str) -> IResult<&str, (f64, f64)> {
    alt((air, oxygen, trimix, nitrox, bare_percent)).parse(input)
}

fn air(input: &str) -> IResult<&str, (f64, f64)> {
    value((GasMix::AIR.o2, 0.0), tag_no_case("air")).parse(input)
}

fn oxygen(input: &str) -> IResult<&str, (f64, f64)> {
    value((100.0, 0.0), alt((tag_no_case("oxygen"), tag_no_case("o2")))).parse(input)
}

fn trimix(input: &str) -> IResult<&str, (f64, f64)> {
    preceded(
        mix_prefix(alt((tag_no_case("trimix"), tag_no_case("tx")))),
        separated_pair(
            double,
            delimited(multispace0, char('/'), multispace0),
            double,
        ),
    )
    .parse(input)
}

fn nitrox(input: &str) -> IResult<&str, (f64, f64)> {
    map(
        preceded(
            mix_prefix(alt((
                tag_no_case("eanx"),
                tag_no_case("ean"),
                tag_no_case("nitrox"),
                tag_no_case("nx"),
            ))),
            terminated(double, opt(preceded(multispace0, char('%')))),
        ),
        |o2| (o2, 0.0),
    )
    .parse(input)
}

fn bare_percent(input: &str) -> IResult<&str, (f64, f64)> {
    map(
        terminated(double, preceded(multispace0, char('%'))),
        |o2| (o2, 0.0),
    )
    .parse(input)
}

/// A mix-name prefix followed by optional whitespace.
fn mix_prefix<'a, P>(
    prefix: P,
) -> impl Parser<&'a str, Output = &'a str, Error = nom::error::Error<&'a str>>
where
    P: Parser<&'a str, Output = &'a str, Error = nom::error::Error<&'a str>>,
{
    terminated(prefix, multispace0)
}
