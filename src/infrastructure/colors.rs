macro_rules! const_color {
    ($name:ident, $value:expr) => {
        paste::paste! {
            pub const $name: u32 = $value;

            pub fn [<$name:lower>]() -> poise::serenity_prelude::Colour {
                poise::serenity_prelude::Colour::new($name)
            }
        }
    };
}

const_color! { BLURPLE,     0x5865F2 }
const_color! { SUCCESS,     0x00FF00 }
const_color! { FAILURE,     0xFF0000 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_wrap_constants() {
        assert_eq!(blurple().0, BLURPLE);
        assert_eq!(success().g(), 0xFF);
        assert_eq!(failure().r(), 0xFF);
    }
}
