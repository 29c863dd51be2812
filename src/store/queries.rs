pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (item_id, starting_price, current_price, start_time, deadline, terminal, highest_bidder, winner_id)
    VALUES ($1, $2, $3, $4, $5, FALSE, NULL, NULL)
    RETURNING *
"#;

pub const GET_AUCTION: &str = "SELECT * FROM auctions WHERE id = $1";

pub const LIST_ACTIVE: &str = r#"
    SELECT * FROM auctions
    WHERE terminal = FALSE AND start_time <= $1 AND deadline > $1
    ORDER BY deadline ASC
"#;

pub const LIST_BIDS: &str = r#"
    SELECT id, auction_id, bidder_identity, amount, created_at
    FROM bids
    WHERE auction_id = $1
    ORDER BY created_at DESC, id DESC
"#;

/// Compare-and-set point for bid acceptance: the row conditions repeat the
/// ledger's precondition checks so a lost race never overwrites a higher bid
/// or touches a closed auction. The deadline compares against the database
/// clock, not a caller timestamp, and GREATEST keeps the deadline monotonic
/// under a stale anti-snipe extension.
pub const RAISE_BID: &str = r#"
    UPDATE auctions
    SET current_price = $2, highest_bidder = $3,
        deadline = GREATEST(deadline, COALESCE($4, deadline))
    WHERE id = $1 AND terminal = FALSE AND deadline > now() AND current_price < $2
    RETURNING *
"#;

pub const APPEND_BID: &str = r#"
    INSERT INTO bids (auction_id, bidder_identity, amount, created_at)
    VALUES ($1, $2, $3, now())
"#;

pub const EXPIRED_AUCTIONS: &str =
    "SELECT id FROM auctions WHERE terminal = FALSE AND deadline <= $1 ORDER BY deadline ASC";

/// Compare-and-set point for finalization; only ever flips FALSE -> TRUE.
pub const CLOSE_AUCTION: &str = r#"
    UPDATE auctions
    SET terminal = TRUE
    WHERE id = $1 AND terminal = FALSE
    RETURNING *
"#;

pub const INSERT_WINNER: &str = r#"
    INSERT INTO winners (auction_id, bidder_identity, amount, won_at, paid, paid_at, order_id)
    VALUES ($1, $2, $3, $4, FALSE, NULL, NULL)
    ON CONFLICT (auction_id) DO NOTHING
    RETURNING *
"#;

pub const LINK_WINNER: &str = "UPDATE auctions SET winner_id = $2 WHERE id = $1";

pub const GET_WINNER: &str = "SELECT * FROM winners WHERE auction_id = $1";

pub const MARK_PAID: &str = r#"
    UPDATE winners
    SET paid = TRUE, paid_at = $2
    WHERE auction_id = $1 AND paid = FALSE
    RETURNING *
"#;

pub const ATTACH_ORDER: &str = r#"
    UPDATE winners
    SET order_id = $2
    WHERE auction_id = $1 AND order_id IS NULL
    RETURNING *
"#;
