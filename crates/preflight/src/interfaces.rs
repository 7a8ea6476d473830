//! Solidity ABI interfaces for the contracts the validators read from and encode calls for.
//!
//! Only the functions actually called are declared.

use alloy_sol_types::sol;

sol! {
    #[sol(all_derives)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
    }

    #[sol(all_derives)]
    interface IERC4626 {
        function asset() external view returns (address);
        function maxDeposit(address receiver) external view returns (uint256);
        function deposit(uint256 assets, address receiver) external returns (uint256 shares);
    }

    /// Bounded-supply ERC-1155 collection with a free per-id claim.
    #[sol(all_derives)]
    interface IKiln1155 {
        function MAX_SUPPLY() external view returns (uint256);
        function balanceOf(address account, uint256 id) external view returns (uint256);
        function totalMinted(uint256 id) external view returns (uint256);
        function uri(uint256 id) external view returns (string);
        function claim(uint256 id, uint256 amount) external;
    }
}
