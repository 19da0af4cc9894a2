// Rendering of numbers for printing and string concatenation.
//
// Finite numbers use the shortest digits that read back to the same double.
// Decimal exponents from -4 up to 20 are written positionally, integral values
// without a fractional part. Outside that range the number is written in
// scientific form with a signed two digit exponent, e.g. `1e+21` or `2.5e-07`.
// Non-finite values are spelled `inf`, `-inf` and `nan`.

const MIN_POSITIONAL_EXPONENT: i32 = -4;
const MAX_POSITIONAL_EXPONENT: i32 = 20;

pub fn format(n: f64) -> String {
    if n.is_nan() {
        String::from("nan")
    } else if n.is_infinite() {
        if n > 0.0 {
            String::from("inf")
        } else {
            String::from("-inf")
        }
    } else if n == 0.0 {
        format!("{}", n)
    } else {
        general(n)
    }
}

fn general(n: f64) -> String {
    let scientific = format!("{:e}", n);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => return format!("{}", n),
    };

    if (MIN_POSITIONAL_EXPONENT..=MAX_POSITIONAL_EXPONENT).contains(&exponent) {
        format!("{}", n)
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    }
}
