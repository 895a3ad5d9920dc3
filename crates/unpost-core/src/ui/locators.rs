use super::{Locator, LocatorChain};

/// Every control the UI backend touches, each as an ordered probe list.
#[derive(Debug, Clone)]
pub struct Locators {
    pub entry: LocatorChain,
    pub permalink: LocatorChain,
    pub text: LocatorChain,
    pub social_context: LocatorChain,
    pub unrepost: LocatorChain,
    pub unrepost_confirm: LocatorChain,
    pub more_menu: LocatorChain,
    pub delete_menu_item: LocatorChain,
    pub delete_confirm: LocatorChain,
}

impl Default for Locators {
    fn default() -> Self {
        Self {
            entry: LocatorChain::new(
                "entry",
                vec![
                    Locator::css(r#"article[data-testid="tweet"]"#),
                    Locator::css("article[role='article']"),
                ],
            ),
            permalink: LocatorChain::new(
                "permalink",
                vec![
                    Locator::css(r#"a[href*="/status/"]:has(time)"#),
                    Locator::css(r#"a[href*="/status/"]"#),
                ],
            ),
            text: LocatorChain::new(
                "text",
                vec![
                    Locator::css(r#"[data-testid="tweetText"]"#),
                    Locator::css("div[lang]"),
                ],
            ),
            social_context: LocatorChain::new(
                "social_context",
                vec![Locator::css(r#"[data-testid="socialContext"]"#)],
            ),
            unrepost: LocatorChain::new(
                "unrepost",
                vec![
                    Locator::css(r#"[data-testid="unretweet"]"#),
                    Locator::css(r#"button[aria-label*="Undo repost"]"#),
                ],
            ),
            unrepost_confirm: LocatorChain::new(
                "unrepost_confirm",
                vec![
                    Locator::css(r#"[data-testid="unretweetConfirm"]"#),
                    Locator::xpath(r#"//div[@role="menuitem"][.//span[text()="Undo repost"]]"#),
                ],
            ),
            more_menu: LocatorChain::new(
                "more_menu",
                vec![
                    Locator::css(r#"[data-testid="caret"]"#),
                    Locator::css(r#"button[aria-label="More"]"#),
                ],
            ),
            delete_menu_item: LocatorChain::new(
                "delete_menu_item",
                vec![
                    Locator::xpath(r#"//div[@role="menuitem"][.//span[text()="Delete"]]"#),
                    Locator::xpath(r#"//*[@role="menuitem"][contains(., "Delete")]"#),
                ],
            ),
            delete_confirm: LocatorChain::new(
                "delete_confirm",
                vec![
                    Locator::css(r#"[data-testid="confirmationSheetConfirm"]"#),
                    Locator::xpath(r#"//button[.//span[text()="Delete"]]"#),
                ],
            ),
        }
    }
}
